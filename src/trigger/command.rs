use crate::deploy::Environment;

pub const DEPLOY_DEV_COMMAND: &str = ".deploy to dev";
pub const DEPLOY_PROD_COMMAND: &str = ".deploy to prod";

/// Find a deploy command in a pull request comment.
///
/// A command is a line that, once trimmed, equals one of the trigger phrases
/// exactly. The first such line wins.
pub fn parse_comment(body: &str) -> Option<Environment> {
    body.lines().find_map(|line| match line.trim() {
        DEPLOY_DEV_COMMAND => Some(Environment::Development),
        DEPLOY_PROD_COMMAND => Some(Environment::Production),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_phrases() {
        assert_eq!(parse_comment(".deploy to dev"), Some(Environment::Development));
        assert_eq!(parse_comment(".deploy to prod"), Some(Environment::Production));
        assert_eq!(parse_comment("  .deploy to prod \r\n"), Some(Environment::Production));
    }

    #[test]
    fn test_first_command_line_wins() {
        let body = "Looks good to me.\n.deploy to prod\n.deploy to dev";
        assert_eq!(parse_comment(body), Some(Environment::Production));
    }

    #[test]
    fn test_near_misses_are_ignored() {
        assert_eq!(parse_comment(".Deploy to dev"), None);
        assert_eq!(parse_comment("please .deploy to dev"), None);
        assert_eq!(parse_comment(".deploy to development"), None);
        assert_eq!(parse_comment(".deploy to staging"), None);
        assert_eq!(parse_comment(""), None);
    }
}
