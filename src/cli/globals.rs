use secrecy::SecretString;

/// Settings shared by every action.
#[derive(Clone)]
pub struct GlobalArgs {
    pub secret: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("secret", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(SecretString::from("s3cr3t".to_string()));
        assert_eq!(args.secret.expose_secret(), "s3cr3t");

        let output = format!("{args:?}");
        assert!(output.contains("***"));
        assert!(!output.contains("s3cr3t"));
    }
}
