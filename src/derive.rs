macro_rules! reader_with_options {
    ($this:ident: $options:ident) => {
        impl crate::Sealed for $this {}

        impl<'bytes> crate::ReaderWithOptions<crate::Borrowed<'bytes>> for $this {
            type Error = Error;
            type Item = $this;
            type Options = $options;

            fn read(source: crate::Borrowed<'bytes>, options: &Self::Options) -> Result<Self::Item> {
                let mut cursor = ::std::io::Cursor::new(source.0);
                Self::do_read(&mut crate::io::Source::new(&mut cursor), options)
            }
        }

        impl crate::ReaderWithOptions<&::std::fs::File> for $this {
            type Error = Error;
            type Item = $this;
            type Options = $options;

            fn read(source: &::std::fs::File, options: &Self::Options) -> Result<Self::Item> {
                // SAFETY: the mapping only lives for the duration of this read
                let mapping = unsafe { ::memmap2::Mmap::map(source)? };
                Self::read(crate::Borrowed(&mapping[..]), options)
            }
        }

        impl crate::ReaderWithOptions<&::std::path::Path> for $this {
            type Error = Error;
            type Item = $this;
            type Options = $options;

            fn read(source: &::std::path::Path, options: &Self::Options) -> Result<Self::Item> {
                let fd = ::std::fs::File::open(source)?;
                Self::read(&fd, options)
            }
        }
    };
}

pub(crate) use reader_with_options;
