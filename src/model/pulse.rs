use serde::{Deserialize, Serialize};

/// A scheduled instant at which a compositor is forced to a new value.
///
/// A pulse without a target only marks a boundary, which is what the last pulse of a
/// schedule is used for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    pub time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compositor: Option<String>,
    #[serde(default)]
    pub value: f64,
}

impl Pulse {
    /// Creates a pulse. An empty compositor name means no override.
    pub fn new(time: f64, compositor: &str, value: f64) -> Self {
        let compositor = match compositor.trim() {
            "" => None,
            name => Some(name.to_string()),
        };

        Self {
            time,
            compositor,
            value,
        }
    }

    /// A boundary without override.
    pub fn stop(time: f64) -> Self {
        Self {
            time,
            compositor: None,
            value: 0.0,
        }
    }

    /// Name of the overridden compositor, if any. Blank names count as none.
    pub fn target(&self) -> Option<&str> {
        self.compositor.as_deref().filter(|name| !name.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_is_boundary() {
        assert_eq!(Pulse::new(500.0, "", 0.0), Pulse::stop(500.0));
        assert_eq!(Pulse::new(0.0, "A", 10.0).target(), Some("A"));
    }
}
