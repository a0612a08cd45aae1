//! Structural checks for Guido Music Notation text.
//!
//! This is not a Guido parser: it verifies the shape of the text (balanced
//! sequences, segments, chords, tag parameters and ranges, well-formed
//! events) without giving any meaning to tags or durations.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuidoError {
    #[error("empty Guido text")]
    Empty,

    #[error("unexpected character '{ch}' at offset {offset}")]
    Unexpected { ch: char, offset: usize },

    #[error("expected '{expected}' at offset {offset}")]
    Expected { expected: char, offset: usize },

    #[error("unterminated {what} starting at offset {offset}")]
    Unterminated { what: &'static str, offset: usize },

    #[error("unknown event \"{name}\" at offset {offset}")]
    UnknownEvent { name: String, offset: usize },

    #[error("content after the end of the score at offset {offset}")]
    Trailing { offset: usize },

    #[error("score contains no events or tags")]
    NoContent,

    #[error("nesting deeper than {} levels at offset {offset}", MAX_DEPTH)]
    TooDeep { offset: usize },
}

/// Deepest nesting of tag ranges and chords accepted.
pub const MAX_DEPTH: usize = 256;

/// What a well-formed score contains.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GuidoSummary {
    pub voices: usize,
    pub events: usize,
    pub tags: usize,
}

const NOTE_NAMES: [&str; 23] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "cis", "dis", "fis", "gis", "ais", "do", "re", "mi",
    "fa", "sol", "la", "si", "ti", "empty", "_",
];

pub fn check_guido(text: &str) -> Result<GuidoSummary, GuidoError> {
    let mut checker = GuidoChecker::new(text);
    checker.check()
}

struct GuidoChecker<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
    summary: GuidoSummary,
}

impl<'a> GuidoChecker<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
            summary: GuidoSummary::default(),
        }
    }

    fn check(&mut self) -> Result<GuidoSummary, GuidoError> {
        self.skip_trivia()?;
        match self.peek() {
            None => return Err(GuidoError::Empty),
            Some('{') => self.segment()?,
            Some('[') => self.sequence()?,
            Some(ch) => {
                return Err(GuidoError::Unexpected {
                    ch,
                    offset: self.pos,
                });
            }
        }

        self.skip_trivia()?;
        if self.peek().is_some() {
            return Err(GuidoError::Trailing { offset: self.pos });
        }
        if self.summary.events + self.summary.tags == 0 {
            return Err(GuidoError::NoContent);
        }
        Ok(self.summary)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.src[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        let src = self.src;
        &src[start..self.pos]
    }

    fn unexpected(&self) -> GuidoError {
        match self.peek() {
            Some(ch) => GuidoError::Unexpected {
                ch,
                offset: self.pos,
            },
            None => GuidoError::Unterminated {
                what: "score",
                offset: self.pos,
            },
        }
    }

    // Whitespace, `%` line comments and `(* ... *)` block comments.
    fn skip_trivia(&mut self) -> Result<(), GuidoError> {
        loop {
            self.eat_while(char::is_whitespace);
            match (self.peek(), self.peek_second()) {
                (Some('%'), _) => {
                    self.eat_while(|c| c != '\n');
                }
                (Some('('), Some('*')) => {
                    let start = self.pos;
                    match self.src[start + 2..].find("*)") {
                        Some(idx) => self.pos = start + 2 + idx + 2,
                        None => {
                            return Err(GuidoError::Unterminated {
                                what: "comment",
                                offset: start,
                            });
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    // { [ ... ], [ ... ] }
    fn segment(&mut self) -> Result<(), GuidoError> {
        let start = self.pos;
        self.bump();
        self.skip_trivia()?;
        if self.peek() == Some('}') {
            self.bump();
            return Ok(());
        }

        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some('[') => self.sequence()?,
                None => {
                    return Err(GuidoError::Unterminated {
                        what: "segment",
                        offset: start,
                    });
                }
                Some(_) => {
                    return Err(GuidoError::Expected {
                        expected: '[',
                        offset: self.pos,
                    });
                }
            }

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    return Ok(());
                }
                None => {
                    return Err(GuidoError::Unterminated {
                        what: "segment",
                        offset: start,
                    });
                }
                Some(_) => {
                    return Err(GuidoError::Expected {
                        expected: '}',
                        offset: self.pos,
                    });
                }
            }
        }
    }

    fn sequence(&mut self) -> Result<(), GuidoError> {
        let start = self.pos;
        self.bump();
        self.summary.voices += 1;

        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => {
                    return Err(GuidoError::Unterminated {
                        what: "sequence",
                        offset: start,
                    });
                }
                Some(']') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => self.element()?,
            }
        }
    }

    fn element(&mut self) -> Result<(), GuidoError> {
        if self.depth >= MAX_DEPTH {
            return Err(GuidoError::TooDeep { offset: self.pos });
        }
        self.depth += 1;
        let result = self.element_inner();
        self.depth -= 1;
        result
    }

    fn element_inner(&mut self) -> Result<(), GuidoError> {
        match self.peek() {
            Some('\\') => self.tag(),
            Some('{') => self.chord(),
            Some('|') => {
                self.bump();
                self.summary.tags += 1;
                Ok(())
            }
            Some(ch) if ch == '_' || ch.is_ascii_alphabetic() => self.event(),
            _ => Err(self.unexpected()),
        }
    }

    fn chord(&mut self) -> Result<(), GuidoError> {
        let start = self.pos;
        self.bump();

        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => {
                    return Err(GuidoError::Unterminated {
                        what: "chord",
                        offset: start,
                    });
                }
                Some('}') => {
                    self.bump();
                    return Ok(());
                }
                Some(',') => {
                    self.bump();
                }
                Some('\\') => self.tag()?,
                Some(ch) if ch == '_' || ch.is_ascii_alphabetic() => self.event()?,
                Some(_) => return Err(self.unexpected()),
            }
        }
    }

    // \name, \name<params>, \name(range), \name<params>(range)
    fn tag(&mut self) -> Result<(), GuidoError> {
        self.bump();
        let name = self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
        if name.is_empty() || !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(self.unexpected());
        }
        // tag id suffix, e.g. \slurBegin:1
        if self.peek() == Some(':') {
            self.bump();
            if self.eat_while(|c| c.is_ascii_digit()).is_empty() {
                return Err(self.unexpected());
            }
        }
        self.summary.tags += 1;

        self.skip_trivia()?;
        if self.peek() == Some('<') {
            self.tag_params()?;
            self.skip_trivia()?;
        }
        if self.peek() == Some('(') {
            self.tag_range()?;
        }
        Ok(())
    }

    fn tag_params(&mut self) -> Result<(), GuidoError> {
        let start = self.pos;
        self.bump();

        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => {
                    return Err(GuidoError::Unterminated {
                        what: "tag parameters",
                        offset: start,
                    });
                }
                Some('>') => {
                    self.bump();
                    return Ok(());
                }
                Some('"') => self.string()?,
                Some(',') | Some('=') => {
                    self.bump();
                }
                Some(ch) if ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.') => {
                    self.bump();
                    self.eat_while(|c| c.is_ascii_digit() || c == '.');
                    // unit suffix: cm, mm, hs, pt...
                    self.eat_while(|c| c.is_ascii_alphabetic());
                }
                Some(ch) if ch.is_ascii_alphabetic() => {
                    self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
                }
                Some(_) => return Err(self.unexpected()),
            }
        }
    }

    fn tag_range(&mut self) -> Result<(), GuidoError> {
        let start = self.pos;
        self.bump();

        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => {
                    return Err(GuidoError::Unterminated {
                        what: "tag range",
                        offset: start,
                    });
                }
                Some(')') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => self.element()?,
            }
        }
    }

    fn string(&mut self) -> Result<(), GuidoError> {
        let start = self.pos;
        self.bump();

        while let Some(ch) = self.bump() {
            match ch {
                '\\' => {
                    self.bump();
                }
                '"' => return Ok(()),
                _ => {}
            }
        }
        Err(GuidoError::Unterminated {
            what: "string",
            offset: start,
        })
    }

    // name accidentals? octave? duration? dots?
    fn event(&mut self) -> Result<(), GuidoError> {
        let start = self.pos;
        let name = if self.peek() == Some('_') {
            self.bump();
            "_"
        } else {
            self.eat_while(|c| c.is_ascii_alphabetic())
        };
        if !NOTE_NAMES.contains(&name) {
            return Err(GuidoError::UnknownEvent {
                name: name.to_string(),
                offset: start,
            });
        }

        self.eat_while(|c| c == '#' || c == '&');

        if self.peek() == Some('-') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        self.eat_while(|c| c.is_ascii_digit());

        match self.peek() {
            Some('/') => {
                self.bump();
                self.expect_digits()?;
            }
            Some('*') => {
                self.bump();
                self.expect_digits()?;
                if self.peek() == Some('/') {
                    self.bump();
                    self.expect_digits()?;
                }
            }
            _ => {}
        }

        self.eat_while(|c| c == '.');
        self.summary.events += 1;
        Ok(())
    }

    fn expect_digits(&mut self) -> Result<(), GuidoError> {
        if self.eat_while(|c| c.is_ascii_digit()).is_empty() {
            match self.peek() {
                Some(ch) => Err(GuidoError::Unexpected {
                    ch,
                    offset: self.pos,
                }),
                None => Err(GuidoError::Unterminated {
                    what: "duration",
                    offset: self.pos,
                }),
            }
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_voice() {
        let summary = check_guido("[ \\meter<\"4/4\"> c1/4 d e&2*3/8. _/8 ]").unwrap();
        assert_eq!(
            summary,
            GuidoSummary {
                voices: 1,
                events: 4,
                tags: 1
            }
        );
    }

    #[test]
    fn test_segment_with_chords_and_ranges() {
        let gmn = r#"
% generated
{
  [ \clef<"g2"> \key<-2> \slur( c1/4 { e, g } ) | b-1/2 ],
  (* second voice *)
  [ \staff<2> \text<"dolce", dy=-3hs>( f0/2 ) a#0 ]
}
"#;
        let summary = check_guido(gmn).unwrap();
        assert_eq!(summary.voices, 2);
        assert_eq!(summary.events, 6);
        assert_eq!(summary.tags, 6);
    }

    #[test]
    fn test_tag_id_and_empty_event() {
        let summary = check_guido("[ \\beamBegin:1 empty*1/4 \\beamEnd:1 ]").unwrap();
        assert_eq!(summary.events, 1);
        assert_eq!(summary.tags, 2);
    }

    #[test]
    fn test_empty() {
        assert_eq!(check_guido("   % nothing\n"), Err(GuidoError::Empty));
        assert_eq!(check_guido("[ ]"), Err(GuidoError::NoContent));
        assert_eq!(check_guido("{}"), Err(GuidoError::NoContent));
    }

    #[test]
    fn test_unbalanced() {
        assert_eq!(
            check_guido("[ c d"),
            Err(GuidoError::Unterminated {
                what: "sequence",
                offset: 0
            })
        );
        assert_eq!(
            check_guido("{ [ c ] ]"),
            Err(GuidoError::Expected {
                expected: '}',
                offset: 8
            })
        );
        assert_eq!(check_guido("[ c ] ]"), Err(GuidoError::Trailing { offset: 6 }));
    }

    #[test]
    fn test_unterminated_string_and_comment() {
        assert_eq!(
            check_guido("[ \\title<\"Sonata> c ]"),
            Err(GuidoError::Unterminated {
                what: "string",
                offset: 9
            })
        );
        assert_eq!(
            check_guido("[ c (* open"),
            Err(GuidoError::Unterminated {
                what: "comment",
                offset: 4
            })
        );
    }

    #[test]
    fn test_end_of_input_offset() {
        assert_eq!(
            check_guido("[ \\"),
            Err(GuidoError::Unterminated {
                what: "score",
                offset: 3
            })
        );
    }

    #[test]
    fn test_nesting_depth() {
        let nested = |levels: usize| {
            format!("[ {}c{} ]", "\\t(".repeat(levels), ")".repeat(levels))
        };

        let summary = check_guido(&nested(MAX_DEPTH - 1)).unwrap();
        assert_eq!(summary.tags, MAX_DEPTH - 1);
        assert_eq!(summary.events, 1);

        // each level is three bytes, starting after "[ "
        assert_eq!(
            check_guido(&nested(MAX_DEPTH)),
            Err(GuidoError::TooDeep {
                offset: 2 + 3 * MAX_DEPTH
            })
        );
        assert!(matches!(
            check_guido(&nested(200_000)),
            Err(GuidoError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_bad_events() {
        assert_eq!(
            check_guido("[ x4 ]"),
            Err(GuidoError::UnknownEvent {
                name: "x".to_string(),
                offset: 2
            })
        );
        assert_eq!(
            check_guido("[ c/ ]"),
            Err(GuidoError::Unexpected {
                ch: ' ',
                offset: 4
            })
        );
        assert_eq!(
            check_guido("<score-partwise/>"),
            Err(GuidoError::Unexpected {
                ch: '<',
                offset: 0
            })
        );
    }
}
