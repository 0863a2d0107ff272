use serde_json::Value;

use crate::{error::Result, query::helpers::Helpers};

/// Raw expression behind an `extra` column, or a computed annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Value of a column path on the current document.
    Field(String),
    Upper(Box<Expr>),
    Lower(Box<Expr>),
    /// Character count of a string.
    Length(Box<Expr>),
    /// Text concatenation; null if any part is null.
    Concat(Vec<Expr>),
}

impl Expr {
    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn field(path: &str) -> Self {
        Expr::Field(path.to_string())
    }

    pub fn upper(expr: Expr) -> Self {
        Expr::Upper(Box::new(expr))
    }

    pub fn lower(expr: Expr) -> Self {
        Expr::Lower(Box::new(expr))
    }

    pub fn length(expr: Expr) -> Self {
        Expr::Length(Box::new(expr))
    }

    pub fn concat(parts: Vec<Expr>) -> Self {
        Expr::Concat(parts)
    }

    /// Every column path the expression reads.
    pub fn paths(&self) -> Vec<&str> {
        match self {
            Expr::Literal(_) => vec![],
            Expr::Field(path) => vec![path.as_str()],
            Expr::Upper(e) | Expr::Lower(e) | Expr::Length(e) => e.paths(),
            Expr::Concat(parts) => parts.iter().flat_map(Expr::paths).collect(),
        }
    }

    /// Evaluate with `field` supplying the value of each column path.
    pub fn eval<F>(&self, field: &mut F) -> Result<Value>
    where
        F: FnMut(&str) -> Result<Value>,
    {
        Ok(match self {
            Expr::Literal(v) => v.clone(),
            Expr::Field(path) => field(path.as_str())?,
            Expr::Upper(e) => match e.eval(field)? {
                Value::String(s) => Value::String(s.to_uppercase()),
                _ => Value::Null,
            },
            Expr::Lower(e) => match e.eval(field)? {
                Value::String(s) => Value::String(s.to_lowercase()),
                _ => Value::Null,
            },
            Expr::Length(e) => match e.eval(field)? {
                Value::String(s) => Value::from(s.chars().count() as u64),
                _ => Value::Null,
            },
            Expr::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    match Helpers::as_text(&part.eval(field)?) {
                        Some(text) => out.push_str(&text),
                        None => return Ok(Value::Null),
                    }
                }
                Value::String(out)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(expr: &Expr, doc: &Value) -> Value {
        expr.eval(&mut |path: &str| Ok(doc.get(path).cloned().unwrap_or(Value::Null))).unwrap()
    }

    #[test]
    fn string_functions() {
        let doc = json!({"name": "Ada Lovelace"});
        assert_eq!(eval(&Expr::upper(Expr::field("name")), &doc), json!("ADA LOVELACE"));
        assert_eq!(eval(&Expr::lower(Expr::field("name")), &doc), json!("ada lovelace"));
        assert_eq!(eval(&Expr::length(Expr::field("name")), &doc), json!(12));
        assert_eq!(eval(&Expr::upper(Expr::lit(3)), &doc), Value::Null);
    }

    #[test]
    fn concat_propagates_null() {
        let doc = json!({"first": "Ada", "year": 1815, "nick": null});
        let full = Expr::concat(vec![Expr::field("first"), Expr::lit(" "), Expr::field("year")]);
        assert_eq!(eval(&full, &doc), json!("Ada 1815"));

        let with_null = Expr::concat(vec![Expr::field("first"), Expr::field("nick")]);
        assert_eq!(eval(&with_null, &doc), Value::Null);
    }

    #[test]
    fn paths_lists_every_field() {
        let expr = Expr::concat(vec![Expr::field("a"), Expr::upper(Expr::field("b__c")), Expr::lit("x")]);
        assert_eq!(expr.paths(), vec!["a", "b__c"]);
    }
}
