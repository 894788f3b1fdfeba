pub mod comment;
pub mod debounce;
pub mod feed;
pub mod model;
pub mod optimistic;
pub mod time;

pub mod item {
    use crate::valid::Validator;
    use tracing::trace;

    pub const TITLE_MAX: usize = 120;
    pub const COMMENT_MAX: usize = 5000;
    pub const CATALOG_NAME_MAX: usize = 50;
    pub const REASON_MAX: usize = 500;
    pub const FEEDBACK_MAX: usize = 2000;

    pub fn process_title<S: AsRef<str>>(title: S) -> Result<String, String> {
        let mut errors = String::new();
        let title = title.as_ref().trim().to_string();
        if title.is_blank() {
            errors += "title is required\n";
        }
        if title.is_bigger_than(TITLE_MAX) {
            errors += "title must be shorter than 121 characters\n";
        }

        finish(title, errors)
    }

    pub fn process_comment<S: AsRef<str>>(content: S) -> Result<String, String> {
        let mut errors = String::new();
        let content = content.as_ref().trim().to_string();
        if content.is_blank() {
            errors += "comment can't be empty\n";
        }
        if content.is_bigger_than(COMMENT_MAX) {
            errors += "comment must be shorter than 5001 characters\n";
        }

        finish(content, errors)
    }

    /// Blank input means "no url" and yields `Ok(None)`.
    pub fn process_url<S: AsRef<str>>(url: S) -> Result<Option<String>, String> {
        let url = url.as_ref().trim().to_string();
        if url.is_blank() {
            return Ok(None);
        }
        if !url.is_http_url() {
            trace!("invalid url {url}");
            return Err("url must start with http:// or https://".to_string());
        }

        Ok(Some(url))
    }

    pub fn process_catalog_name<S: AsRef<str>>(name: S) -> Result<String, String> {
        let mut errors = String::new();
        let name = name.as_ref().trim().to_string();
        if name.is_blank() {
            errors += "name is required\n";
        }
        if name.is_bigger_than(CATALOG_NAME_MAX) {
            errors += "name must be shorter than 51 characters\n";
        }

        finish(name, errors)
    }

    pub fn process_feedback<S: AsRef<str>>(message: S) -> Result<String, String> {
        let mut errors = String::new();
        let message = message.as_ref().trim().to_string();
        if message.is_blank() {
            errors += "please enter a message\n";
        }
        if message.is_bigger_than(FEEDBACK_MAX) {
            errors += "message must be shorter than 2001 characters\n";
        }

        finish(message, errors)
    }

    pub fn process_reason<S: AsRef<str>>(reason: S) -> Result<Option<String>, String> {
        let reason = reason.as_ref().trim().to_string();
        if reason.is_bigger_than(REASON_MAX) {
            return Err("reason must be shorter than 501 characters".to_string());
        }

        Ok(Some(reason).filter(|reason| !reason.is_empty()))
    }

    fn finish(value: String, mut errors: String) -> Result<String, String> {
        if errors.is_empty() {
            Ok(value)
        } else {
            let _ = errors.pop();
            trace!("errors {errors}");
            Err(errors)
        }
    }

    #[cfg(test)]
    mod item_tests {
        use crate::item::{
            process_catalog_name, process_comment, process_feedback, process_reason,
            process_title, process_url,
        };
        use pretty_assertions::assert_eq;
        use test_log::test;

        #[test]
        fn test_process_title() {
            assert_eq!(process_title("  Robot chef ").unwrap(), "Robot chef");
            assert!(process_title("   ").is_err());
            assert!(process_title("a".repeat(120)).is_ok());
            assert!(process_title("a".repeat(121)).is_err());
        }

        #[test]
        fn test_process_comment() {
            assert_eq!(process_comment(" nice ").unwrap(), "nice");
            assert!(process_comment("").is_err());
            assert!(process_comment(" \n\t ").is_err());
        }

        #[test]
        fn test_process_url() {
            assert_eq!(process_url(" ").unwrap(), None);
            assert_eq!(
                process_url("https://example.com/app ").unwrap(),
                Some("https://example.com/app".to_string())
            );
            assert!(process_url("ftp://example.com").is_err());
            assert!(process_url("example.com").is_err());
        }

        #[test]
        fn test_process_catalog_name_and_reason() {
            assert!(process_catalog_name("rust").is_ok());
            assert!(process_catalog_name("").is_err());
            assert_eq!(process_reason("  ").unwrap(), None);
            assert_eq!(process_reason("404").unwrap(), Some("404".to_string()));
            assert!(process_reason("x".repeat(501)).is_err());
        }

        #[test]
        fn test_process_feedback() {
            assert_eq!(process_feedback(" dark mode please ").unwrap(), "dark mode please");
            assert_eq!(process_feedback("  ").unwrap_err(), "please enter a message");
            assert!(process_feedback("x".repeat(2001)).is_err());
        }
    }
}

pub mod valid {
    pub trait Validator {
        fn is_blank(&self) -> bool;
        fn is_smaller_than(&self, size: usize) -> bool;
        fn is_bigger_than(&self, size: usize) -> bool;
        fn is_http_url(&self) -> bool;
    }

    impl<S: AsRef<str>> Validator for S {
        fn is_blank(&self) -> bool {
            self.as_ref().trim().is_empty()
        }
        fn is_bigger_than(&self, size: usize) -> bool {
            self.as_ref().chars().count() > size
        }
        fn is_smaller_than(&self, size: usize) -> bool {
            self.as_ref().chars().count() < size
        }
        fn is_http_url(&self) -> bool {
            url::Url::parse(self.as_ref())
                .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
                .unwrap_or_default()
        }
    }

    #[cfg(test)]
    mod valid_tests {
        use crate::valid::Validator;
        use test_log::test;

        #[test]
        fn test_validator() {
            assert!(" \t".is_blank());
            assert!(!" a ".is_blank());
            assert!(!"input".is_smaller_than(5));
            assert!("input".is_smaller_than(6));
            assert!(!"ąčęėį".is_bigger_than(5));
            assert!("input".is_bigger_than(4));
            assert!("https://hey.com/a?b=1".is_http_url());
            assert!("http://localhost:8000".is_http_url());
            assert!(!"mailto:hey@hey.com".is_http_url());
            assert!(!"hey.com".is_http_url());
        }
    }
}
