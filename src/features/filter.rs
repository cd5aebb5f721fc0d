//! Parser for provision-capability filters.
//!
//! Auto-features declare their activation condition as OSGi/LDAP filters:
//!
//! ```text
//! (&(type=osgi.subsystem.feature)(|(osgi.identity=a-1.0)(osgi.identity=a-1.1)))
//! ```
//!
//! Only `osgi.identity` comparisons constrain activation. Other attribute
//! comparisons and negated sub-filters become non-constraining clauses
//! (an empty `All`), since removing a feature from a change set can never
//! make an auto-feature newly affected.

use super::model::ActivationCondition;

const IDENTITY_ATTRIBUTE: &str = "osgi.identity";

/// Parse one filter expression into an activation condition.
pub fn parse_filter(input: &str) -> Result<ActivationCondition, String> {
    let mut parser = FilterParser::new(input);
    parser.skip_ws();
    let condition = parser.parse_filter()?;
    parser.skip_ws();
    if parser.pos < parser.chars.len() {
        return Err(format!(
            "unexpected trailing input at offset {} in filter {}",
            parser.pos, input
        ));
    }
    Ok(normalize(condition))
}

/// Combine several capability filters, all of which must hold.
pub fn parse_capabilities<'a, I>(filters: I) -> Result<ActivationCondition, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let clauses = filters
        .into_iter()
        .map(parse_filter)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(normalize(ActivationCondition::All(clauses)))
}

fn vacuous() -> ActivationCondition {
    ActivationCondition::All(Vec::new())
}

fn is_vacuous(condition: &ActivationCondition) -> bool {
    matches!(condition, ActivationCondition::All(children) if children.is_empty())
}

/// Flatten nested conjunctions, drop vacuous conjuncts and unwrap
/// single-child nodes.
fn normalize(condition: ActivationCondition) -> ActivationCondition {
    match condition {
        ActivationCondition::All(children) => {
            let mut flat = Vec::new();
            for child in children.into_iter().map(normalize) {
                match child {
                    ActivationCondition::All(inner) => flat.extend(inner),
                    other => flat.push(other),
                }
            }
            flat.retain(|c| !is_vacuous(c));
            if flat.len() == 1 {
                flat.remove(0)
            } else {
                ActivationCondition::All(flat)
            }
        }
        ActivationCondition::Any(children) => {
            let mut children: Vec<_> = children.into_iter().map(normalize).collect();
            if children.len() == 1 {
                children.remove(0)
            } else {
                ActivationCondition::Any(children)
            }
        }
        leaf => leaf,
    }
}

struct FilterParser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> FilterParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(format!(
                "expected '{}' but found '{}' at offset {} in filter {}",
                expected, c, self.pos, self.input
            )),
            None => Err(format!(
                "expected '{}' but filter ended: {}",
                expected, self.input
            )),
        }
    }

    fn parse_filter(&mut self) -> Result<ActivationCondition, String> {
        self.expect('(')?;
        self.skip_ws();
        let condition = match self.peek() {
            Some('&') => {
                self.pos += 1;
                ActivationCondition::All(self.parse_list()?)
            }
            Some('|') => {
                self.pos += 1;
                ActivationCondition::Any(self.parse_list()?)
            }
            Some('!') => {
                self.pos += 1;
                // Validate the operand even though it does not constrain.
                self.parse_filter()?;
                vacuous()
            }
            Some(_) => self.parse_item()?,
            None => return Err(format!("filter ended after '(': {}", self.input)),
        };
        self.expect(')')?;
        Ok(condition)
    }

    fn parse_list(&mut self) -> Result<Vec<ActivationCondition>, String> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some('(') => items.push(self.parse_filter()?),
                _ => break,
            }
        }
        if items.is_empty() {
            return Err(format!("empty filter list in {}", self.input));
        }
        Ok(items)
    }

    fn parse_item(&mut self) -> Result<ActivationCondition, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '=' | '~' | '<' | '>' | '(' | ')') {
                break;
            }
            self.pos += 1;
        }
        let attribute: String = self.chars[start..self.pos].iter().collect();
        let attribute = attribute.trim().to_string();
        if attribute.is_empty() {
            return Err(format!(
                "missing attribute name at offset {} in filter {}",
                start, self.input
            ));
        }

        let equality = match self.peek() {
            Some('=') => {
                self.pos += 1;
                true
            }
            Some('~' | '<' | '>') => {
                self.pos += 1;
                self.expect('=')?;
                false
            }
            _ => {
                return Err(format!(
                    "missing comparison operator after [ {} ] in filter {}",
                    attribute, self.input
                ))
            }
        };

        let mut value = String::new();
        while let Some(c) = self.peek() {
            match c {
                ')' => break,
                '(' => {
                    return Err(format!(
                        "unescaped '(' in value at offset {} in filter {}",
                        self.pos, self.input
                    ))
                }
                '\\' => {
                    self.pos += 1;
                    if let Some(escaped) = self.peek() {
                        value.push(escaped);
                        self.pos += 1;
                    }
                }
                _ => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
        let value = value.trim();

        if equality && attribute == IDENTITY_ATTRIBUTE && !value.is_empty() && !value.contains('*')
        {
            Ok(ActivationCondition::feature(value))
        } else {
            Ok(vacuous())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_identity_with_type() {
        let cond = parse_filter(
            "(&(type=osgi.subsystem.feature)(osgi.identity=com.ibm.websphere.appserver.jdbc-4.0))",
        )
        .unwrap();
        assert_eq!(
            cond,
            ActivationCondition::feature("com.ibm.websphere.appserver.jdbc-4.0")
        );
    }

    #[test]
    fn test_disjunction() {
        let cond = parse_filter(
            "(&(type=osgi.subsystem.feature)(|(osgi.identity=jdbc-4.0)(osgi.identity=jdbc-4.1)))",
        )
        .unwrap();
        assert_eq!(cond, ActivationCondition::any_of(["jdbc-4.0", "jdbc-4.1"]));
    }

    #[test]
    fn test_capabilities_are_conjoined() {
        let cond = parse_capabilities([
            "(&(type=osgi.subsystem.feature)(osgi.identity=validator-1.0))",
            "(&(type=osgi.subsystem.feature)(|(osgi.identity=jdbc-4.0)(osgi.identity=jdbc-4.2)))",
        ])
        .unwrap();
        assert_eq!(
            cond,
            ActivationCondition::All(vec![
                ActivationCondition::feature("validator-1.0"),
                ActivationCondition::any_of(["jdbc-4.0", "jdbc-4.2"]),
            ])
        );
    }

    #[test]
    fn test_negation_is_non_constraining() {
        let cond = parse_filter(
            "(&(osgi.identity=a-1.0)(!(osgi.identity=b-1.0)))",
        )
        .unwrap();
        assert_eq!(cond, ActivationCondition::feature("a-1.0"));
    }

    #[test]
    fn test_negation_inside_disjunction_keeps_vacuous_branch() {
        let cond = parse_filter("(|(osgi.identity=a)(!(osgi.identity=b)))").unwrap();
        assert_eq!(
            cond,
            ActivationCondition::Any(vec![
                ActivationCondition::feature("a"),
                ActivationCondition::All(vec![]),
            ])
        );
    }

    #[test]
    fn test_whitespace_tolerated() {
        let cond = parse_filter(" ( & (type=osgi.subsystem.feature) (osgi.identity = x-1.0 ) ) ")
            .unwrap();
        assert_eq!(cond, ActivationCondition::feature("x-1.0"));
    }

    #[test]
    fn test_malformed_filters() {
        assert!(parse_filter("(osgi.identity=a").is_err());
        assert!(parse_filter("osgi.identity=a)").is_err());
        assert!(parse_filter("(&)").is_err());
        assert!(parse_filter("(=a)").is_err());
        assert!(parse_filter("(a)").is_err());
        assert!(parse_filter("(a=b)(c=d)").is_err());
    }

    #[test]
    fn test_escaped_value() {
        let cond = parse_filter(r"(osgi.identity=odd\)name)").unwrap();
        assert_eq!(cond, ActivationCondition::feature("odd)name"));
    }
}
