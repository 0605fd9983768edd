/// A free-form error message, built through the `err!` and `bail!` macros.
#[derive(Debug)]
pub(super) struct AdhocError {
    pub(super) message: Box<str>,
}

impl std::error::Error for AdhocError {}

impl core::fmt::Display for AdhocError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}

impl super::Error {
    #[doc(hidden)]
    pub fn from_args(args: core::fmt::Arguments<'_>) -> super::Error {
        let message = match args.as_str() {
            Some(s) => s.into(),
            None => args.to_string().into_boxed_str(),
        };
        super::Error::from(super::ErrorKind::Adhoc(AdhocError { message }))
    }
}
