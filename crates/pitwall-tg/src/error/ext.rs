use super::{err, ErrorKind, Result};
use crate::util::DynError;
use easy_ext::ext;

#[ext(ResultExt)]
pub(crate) impl<T, E> Result<T, E> {
    #[track_caller]
    fn fatal_ctx<S>(self, message: impl FnOnce() -> S) -> Result<T>
    where
        S: Into<String>,
        E: Into<Box<DynError>>,
    {
        // Not using closures (e.g. `map_err`), because `#[track_caller]`
        // doesn't propagate to them.
        match self {
            Ok(value) => Ok(value),
            Err(source) => Err(err!(ErrorKind::Fatal {
                message: message().into(),
                source: Some(source.into()),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_ctx_keeps_the_source() {
        let result: Result<(), std::fmt::Error> = Err(std::fmt::Error);
        let err = result.fatal_ctx(|| "Formatting failed").unwrap_err();

        let ErrorKind::Fatal { message, source } = err.kind() else {
            panic!("expected a fatal error, got {err:?}");
        };
        assert_eq!(message, "Formatting failed");
        assert!(source.is_some());
        assert_eq!(err.kind().to_string(), "FATAL: Formatting failed");
    }
}
