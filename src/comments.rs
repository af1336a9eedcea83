/// Associates `//` line comments with the declarations that follow them.
///
/// A declaration on line `L` owns the run of comment lines directly above it:
/// lines `L-1`, `L-2`, ... are collected while they are `//` lines and the run
/// stops at the first blank or non-comment line. Comments that trail code on
/// the same line are never collected, because such a line is not a comment line.
pub struct CommentExtractor<'a> {
    lines: Vec<&'a str>,
}

impl<'a> CommentExtractor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().collect(),
        }
    }

    /// The comment block above the 1-based `line`, or `""` when there is none.
    pub fn preceding(&self, line: usize) -> String {
        self.preceding_within(line, 0)
    }

    /// Like [`preceding`](Self::preceding), but never looks at `floor` or any
    /// line above it. Members of a body pass the line of its opening brace so
    /// they never pick up the comment of the enclosing declaration.
    pub fn preceding_within(&self, line: usize, floor: usize) -> String {
        let mut collected = Vec::new();
        let mut current = line;
        while current > floor + 1 {
            current -= 1;
            let text = self.lines.get(current - 1).map_or("", |l| l.trim());
            match text.strip_prefix("//") {
                Some(comment) => collected.push(comment.trim()),
                None => break,
            }
        }
        collected.reverse();
        collected.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_comment() {
        let source = "// doc\nstruct S { f string }";
        assert_eq!(CommentExtractor::new(source).preceding(2), "doc");
    }

    #[test]
    fn test_multi_line_comment_keeps_order() {
        let source = "namespace a\n\n//   first  \n// second\nstruct S {}";
        assert_eq!(CommentExtractor::new(source).preceding(5), "first\nsecond");
    }

    #[test]
    fn test_blank_line_stops_scan() {
        let source = "// detached\n\nstruct S {}";
        assert_eq!(CommentExtractor::new(source).preceding(3), "");
    }

    #[test]
    fn test_code_line_stops_scan() {
        let source = "// above code\nnamespace a\n// doc\nstruct S {}";
        assert_eq!(CommentExtractor::new(source).preceding(4), "doc");
    }

    #[test]
    fn test_trailing_comment_is_not_attached() {
        let source = "struct A {} // trailing\nstruct B {}";
        assert_eq!(CommentExtractor::new(source).preceding(2), "");
    }

    #[test]
    fn test_first_line_has_no_comment() {
        assert_eq!(CommentExtractor::new("struct S {}").preceding(1), "");
    }

    #[test]
    fn test_floor_bounds_member_comments() {
        let source = "// enum doc\nenum E { a\n  // b doc\n  b\n}";
        let extractor = CommentExtractor::new(source);
        assert_eq!(extractor.preceding_within(2, 2), "");
        assert_eq!(extractor.preceding_within(4, 2), "b doc");
    }

    #[test]
    fn test_empty_comment_line() {
        let source = "// title\n//\n// body\nstruct S {}";
        assert_eq!(CommentExtractor::new(source).preceding(4), "title\n\nbody");
    }
}
