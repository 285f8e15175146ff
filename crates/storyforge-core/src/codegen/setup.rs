/// Source of the setup virtual module.
///
/// Initializes the preview runtime's globals; the page must load it before
/// the app module.
const SETUP_CODE: &str = r"import { setup } from 'storybook/internal/preview/runtime';

setup();
";

/// Generate the setup module source.
#[must_use]
pub fn generate_setup_code() -> String {
    SETUP_CODE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_calls_runtime_once() {
        let code = generate_setup_code();
        assert!(code.starts_with("import { setup } from 'storybook/internal/preview/runtime';"));
        assert_eq!(code.matches("setup();").count(), 1);
    }
}
