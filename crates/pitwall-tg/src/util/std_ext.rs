use easy_ext::ext;

pub(crate) mod prelude {
    pub(crate) use super::ErrorExt as _;
}

#[ext(ErrorExt)]
pub(crate) impl<E> E
where
    E: std::error::Error + ?Sized,
{
    fn display_chain(&self) -> display_error_chain::DisplayErrorChain<&Self> {
        display_error_chain::DisplayErrorChain::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer {
        source: std::fmt::Error,
    }

    #[test]
    fn display_chain_includes_sources() {
        let err = Outer {
            source: std::fmt::Error,
        };
        let chain = err.display_chain().to_string();

        assert!(chain.starts_with("outer"), "{chain}");
        assert!(chain.contains("an error occurred when formatting an argument"), "{chain}");
    }
}
