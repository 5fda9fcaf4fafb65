//! Helpers for interpreting client supplied paths and listing arguments.

/// Resolves `arg` against the current working directory, yielding a
/// normalised server-relative path that always starts with `/`. Dot and
/// dot-dot segments are resolved textually; traversal above the root is
/// clamped at `/`.
pub fn with_cwd(cwd: &str, arg: &str) -> String {
    let joined = if arg.starts_with('/') {
        arg.to_string()
    } else {
        format!("{}/{}", cwd, arg)
    };
    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Escapes a path for inclusion in a 257 reply: RFC 959 requires embedded
/// double-quotes to be doubled.
pub fn escape_quotes(path: &str) -> String {
    path.replace('"', "\"\"")
}

/// Strips leading `-x` style option words from a LIST/NLST argument, so
/// `-la /pub` becomes `/pub` and a bare `-la` becomes the empty string.
pub fn strip_options(arg: &str) -> &str {
    let mut rest = arg.trim_start();
    while rest.starts_with('-') {
        match rest.find(' ') {
            Some(i) => rest = rest[i + 1..].trim_start(),
            None => return "",
        }
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn with_cwd_relative() {
        assert_eq!(with_cwd("/", "foo"), "/foo");
        assert_eq!(with_cwd("/pub", "foo.txt"), "/pub/foo.txt");
        assert_eq!(with_cwd("/pub", ""), "/pub");
    }

    #[test]
    fn with_cwd_absolute_arg_wins() {
        assert_eq!(with_cwd("/pub", "/etc/motd"), "/etc/motd");
    }

    #[test]
    fn with_cwd_resolves_dots() {
        assert_eq!(with_cwd("/pub/sub", ".."), "/pub");
        assert_eq!(with_cwd("/pub", "./a/./b"), "/pub/a/b");
        assert_eq!(with_cwd("/pub", "../../.."), "/");
        assert_eq!(with_cwd("/", "a//b"), "/a/b");
    }

    #[test]
    fn escape_doubles_quotes() {
        assert_eq!(escape_quotes("/plain"), "/plain");
        assert_eq!(escape_quotes("/a\"b"), "/a\"\"b");
    }

    #[test]
    fn strip_options_removes_leading_flags() {
        assert_eq!(strip_options("-la"), "");
        assert_eq!(strip_options("-la /pub"), "/pub");
        assert_eq!(strip_options("-l -a sub dir"), "sub dir");
        assert_eq!(strip_options("plain"), "plain");
        assert_eq!(strip_options(""), "");
    }
}
