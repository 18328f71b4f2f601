use anyhow::Result;
use quick_xml::events::Event;
use quick_xml::Reader;

/// One markup token, owned so callers can hold it across reader advances.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
    },
    End(String),
    Text(String),
    Eof,
}

/// Positioned cursor over a statement page's markup.
///
/// EDGAR pages are HTML-flavored rather than well-formed XML, so the reader
/// runs with end-name checking off and unmatched closers allowed. Clean end
/// of stream is reported as `Token::Eof`; a tokenizer-level error (genuinely
/// broken markup) propagates as `Err`, so the two are distinguishable.
pub struct TokenCursor<'a> {
    reader: Reader<&'a [u8]>,
    buf: Vec<u8>,
    pending: Option<Token>,
}

impl<'a> TokenCursor<'a> {
    pub fn new(page: &'a str) -> Self {
        let mut reader = Reader::from_str(page);
        let config = reader.config_mut();
        config.trim_text(true);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        TokenCursor {
            reader,
            buf: Vec::new(),
            pending: None,
        }
    }

    /// Advance to the next token. Markup constructs the table parsers never
    /// look at (comments, doctype, processing instructions) are skipped here.
    pub fn next_token(&mut self) -> Result<Token> {
        if let Some(token) = self.pending.take() {
            return Ok(token);
        }
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(ref e)) => {
                    let name = lowercase_name(e.name().as_ref());
                    return Ok(Token::Start {
                        attrs: collect_attrs(e),
                        name,
                    });
                }
                Ok(Event::Empty(ref e)) => {
                    // Self-closing tags (<br/>, <td/>) become a start token
                    // with the matching end queued, so cell scans still see a
                    // close for every open.
                    let name = lowercase_name(e.name().as_ref());
                    self.pending = Some(Token::End(name.clone()));
                    return Ok(Token::Start {
                        attrs: collect_attrs(e),
                        name,
                    });
                }
                Ok(Event::End(ref e)) => {
                    return Ok(Token::End(lowercase_name(e.name().as_ref())));
                }
                Ok(Event::Text(ref e)) => {
                    return Ok(Token::Text(decode_text(e.as_ref())));
                }
                Ok(Event::CData(ref e)) => {
                    return Ok(Token::Text(String::from_utf8_lossy(e.as_ref()).into_owned()));
                }
                Ok(Event::Eof) => return Ok(Token::Eof),
                Ok(_) => continue,
                Err(e) => return Err(anyhow::anyhow!("markup tokenizer error: {}", e)),
            }
        }
    }
}

fn lowercase_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

/// Attribute names are lowercased and values entity-decoded; malformed
/// attributes in sloppy markup are skipped rather than failing the page.
fn collect_attrs(e: &quick_xml::events::BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .with_checks(false)
        .flatten()
        .map(|attr| {
            let key = lowercase_name(attr.key.as_ref());
            let value = decode_text(&attr.value);
            (key, value)
        })
        .collect()
}

/// EDGAR pages use HTML entities (`&nbsp;`, `&amp;`) that strict XML
/// unescaping rejects, so text goes through the HTML decoder instead.
fn decode_text(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    html_escape::decode_html_entities(text.as_ref()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(page: &str) -> Vec<Token> {
        let mut cursor = TokenCursor::new(page);
        let mut tokens = Vec::new();
        loop {
            let token = cursor.next_token().unwrap();
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    #[test]
    fn test_basic_token_sequence() {
        let tokens = drain("<tr><td class=\"num\">1,234</td></tr>");
        assert_eq!(
            tokens,
            vec![
                Token::Start {
                    name: "tr".to_string(),
                    attrs: vec![],
                },
                Token::Start {
                    name: "td".to_string(),
                    attrs: vec![("class".to_string(), "num".to_string())],
                },
                Token::Text("1,234".to_string()),
                Token::End("td".to_string()),
                Token::End("tr".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_html_entities_decoded() {
        let tokens = drain("<td>Revenue&nbsp;&amp; fees</td>");
        assert!(tokens.contains(&Token::Text("Revenue\u{a0}& fees".to_string())));
    }

    #[test]
    fn test_uppercase_tags_normalized() {
        let tokens = drain("<TR><TD>x</TD></TR>");
        assert_eq!(
            tokens[0],
            Token::Start {
                name: "tr".to_string(),
                attrs: vec![],
            }
        );
    }

    #[test]
    fn test_self_closing_tag_emits_end() {
        let tokens = drain("<td><br/></td>");
        assert_eq!(tokens[1], Token::Start { name: "br".to_string(), attrs: vec![] });
        assert_eq!(tokens[2], Token::End("br".to_string()));
    }

    #[test]
    fn test_eof_is_repeatable_and_not_an_error() {
        let mut cursor = TokenCursor::new("");
        assert_eq!(cursor.next_token().unwrap(), Token::Eof);
        assert_eq!(cursor.next_token().unwrap(), Token::Eof);
    }
}
