//! Module-import filtering.
//!
//! Decides, per imported module pathname, whether its definitions should be
//! auto-indexed. Two ordered rule lists, includes then excludes, evaluated
//! as two passes:
//!
//! 1. With no include rules at all, every pathname is admitted. Once any
//!    include rule exists, a pathname is admitted only if some include glob
//!    matches it.
//! 2. A pathname that survived the include pass is then rejected by the
//!    first matching exclude glob.
//!
//! The asymmetry between "no include rules" and "include rules that fail to
//! match" is load-bearing; do not collapse this into plain set logic.

use globset::{Glob, GlobMatcher};
use tracing::debug;

use crate::error::{DebugError, DebugResult};

/// One compiled glob rule, keeping its source text for display.
#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    matcher: GlobMatcher,
}

impl Rule {
    fn compile(pattern: &str) -> DebugResult<Self> {
        let glob = Glob::new(pattern).map_err(|e| DebugError::InvalidFilterPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    fn matches(&self, pathname: &str) -> bool {
        self.matcher.is_match(pathname)
    }
}

/// Ordered include/exclude glob rules for autoloaded modules.
#[derive(Debug, Clone, Default)]
pub struct ImportFilter {
    includes: Vec<Rule>,
    excludes: Vec<Rule>,
}

impl ImportFilter {
    /// Create a filter with no rules (admits everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule from command syntax: `pattern` includes, `!pattern`
    /// excludes.
    pub fn add_rule(&mut self, rule: &str) -> DebugResult<()> {
        if let Some(pattern) = rule.strip_prefix('!') {
            self.add_exclude(pattern)
        } else {
            self.add_include(rule)
        }
    }

    /// Append an include glob.
    pub fn add_include(&mut self, pattern: &str) -> DebugResult<()> {
        self.includes.push(Rule::compile(pattern)?);
        Ok(())
    }

    /// Append an exclude glob.
    pub fn add_exclude(&mut self, pattern: &str) -> DebugResult<()> {
        self.excludes.push(Rule::compile(pattern)?);
        Ok(())
    }

    /// Drop all rules.
    pub fn clear(&mut self) {
        self.includes.clear();
        self.excludes.clear();
    }

    /// Include pattern texts, in order.
    pub fn include_patterns(&self) -> Vec<&str> {
        self.includes.iter().map(|r| r.pattern.as_str()).collect()
    }

    /// Exclude pattern texts, in order.
    pub fn exclude_patterns(&self) -> Vec<&str> {
        self.excludes.iter().map(|r| r.pattern.as_str()).collect()
    }

    /// Should `pathname`'s definitions be auto-indexed?
    pub fn admit(&self, pathname: &str) -> bool {
        let mut admitted = true;
        for rule in &self.includes {
            if rule.matches(pathname) {
                admitted = true;
                break;
            }
            // An include rule was evaluated and missed: the default flips
            // to reject unless a later include matches.
            admitted = false;
        }
        if admitted {
            for rule in &self.excludes {
                if rule.matches(pathname) {
                    admitted = false;
                    break;
                }
            }
        }
        debug!(pathname, admitted, "import filter");
        admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(includes: &[&str], excludes: &[&str]) -> ImportFilter {
        let mut f = ImportFilter::new();
        for p in includes {
            f.add_include(p).unwrap();
        }
        for p in excludes {
            f.add_exclude(p).unwrap();
        }
        f
    }

    #[test]
    fn test_no_rules_admits_everything() {
        let f = ImportFilter::new();
        assert!(f.admit("lib/x.py"));
        assert!(f.admit("/usr/lib/python/os.py"));
    }

    #[test]
    fn test_include_then_exclude() {
        let f = filter(&["lib/*"], &["lib/test_*"]);
        assert!(f.admit("lib/x.py"));
        assert!(!f.admit("lib/test_x.py"));
    }

    #[test]
    fn test_no_includes_still_excludes() {
        let f = filter(&[], &["*/secret.py"]);
        assert!(f.admit("lib/x.py"));
        assert!(!f.admit("lib/secret.py"));
    }

    #[test]
    fn test_failed_include_rejects() {
        let f = filter(&["app/*"], &[]);
        assert!(f.admit("app/x.py"));
        assert!(!f.admit("lib/x.py"));
    }

    #[test]
    fn test_later_include_can_readmit() {
        let f = filter(&["app/*", "lib/*"], &[]);
        assert!(f.admit("lib/x.py"));
        assert!(f.admit("app/x.py"));
        assert!(!f.admit("etc/x.py"));
    }

    #[test]
    fn test_bang_rule_syntax() {
        let mut f = ImportFilter::new();
        f.add_rule("lib/*").unwrap();
        f.add_rule("!lib/test_*").unwrap();
        assert_eq!(f.include_patterns(), vec!["lib/*"]);
        assert_eq!(f.exclude_patterns(), vec!["lib/test_*"]);
        assert!(!f.admit("lib/test_a.py"));
    }

    #[test]
    fn test_clear_restores_admit_all() {
        let mut f = filter(&["app/*"], &[]);
        assert!(!f.admit("lib/x.py"));
        f.clear();
        assert!(f.admit("lib/x.py"));
    }

    #[test]
    fn test_bad_pattern_is_rejected() {
        let mut f = ImportFilter::new();
        assert!(f.add_include("lib/[").is_err());
    }
}
