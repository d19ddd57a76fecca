use std::fmt;
use std::str::FromStr;

/// Deployment target on the hosted platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Map a branch (or `refs/heads/...` ref) to the environment it deploys to.
    pub fn from_branch(branch: &str) -> Option<Self> {
        match branch.strip_prefix("refs/heads/").unwrap_or(branch) {
            "staging" => Some(Environment::Development),
            "production" => Some(Environment::Production),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "prod" | "production" => Ok(Environment::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_mapping() {
        assert_eq!(
            Environment::from_branch("staging"),
            Some(Environment::Development)
        );
        assert_eq!(
            Environment::from_branch("refs/heads/production"),
            Some(Environment::Production)
        );
        assert_eq!(Environment::from_branch("main"), None);
        assert_eq!(Environment::from_branch("refs/heads/staging-2"), None);
        assert_eq!(Environment::from_branch("refs/tags/production"), None);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Development));
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("production".parse::<Environment>(), Ok(Environment::Production));
        assert!("qa".parse::<Environment>().is_err());
    }
}
