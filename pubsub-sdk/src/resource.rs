//! Fully-qualified broker resource names.
//!
//! The REST API addresses topics and subscriptions by path:
//!
//! ```text
//! projects/{project}/topics/{topic}
//! projects/{project}/subscriptions/{subscription}
//! ```

use std::fmt;

/// Errors produced when building a resource name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceNameError {
    #[error("{kind} name must not be empty")]
    Empty { kind: &'static str },
    #[error("{kind} name `{name}` must not contain '/'")]
    InvalidCharacter { kind: &'static str, name: String },
}

/// A validated `projects/{project}/{collection}/{name}` path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath(String);

impl ResourcePath {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourcePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build `projects/{project}/subscriptions/{subscription}`.
pub fn subscription_path(
    project: &str,
    subscription: &str,
) -> Result<ResourcePath, ResourceNameError> {
    validate("project", project)?;
    validate("subscription", subscription)?;
    Ok(ResourcePath(format!(
        "projects/{project}/subscriptions/{subscription}"
    )))
}

/// Build `projects/{project}/topics/{topic}`.
pub fn topic_path(project: &str, topic: &str) -> Result<ResourcePath, ResourceNameError> {
    validate("project", project)?;
    validate("topic", topic)?;
    Ok(ResourcePath(format!("projects/{project}/topics/{topic}")))
}

fn validate(kind: &'static str, name: &str) -> Result<(), ResourceNameError> {
    if name.is_empty() {
        return Err(ResourceNameError::Empty { kind });
    }
    if name.contains('/') {
        return Err(ResourceNameError::InvalidCharacter {
            kind,
            name: name.to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_path() {
        let path = subscription_path("demo-project", "board-sub").unwrap();
        assert_eq!(
            path.as_str(),
            "projects/demo-project/subscriptions/board-sub"
        );
    }

    #[test]
    fn test_topic_path() {
        let path = topic_path("demo-project", "board").unwrap();
        assert_eq!(path.to_string(), "projects/demo-project/topics/board");
    }

    #[test]
    fn test_rejects_empty_and_nested_names() {
        assert_eq!(
            topic_path("", "board"),
            Err(ResourceNameError::Empty { kind: "project" })
        );
        assert!(matches!(
            subscription_path("demo", "a/b"),
            Err(ResourceNameError::InvalidCharacter { kind: "subscription", .. })
        ));
    }
}
