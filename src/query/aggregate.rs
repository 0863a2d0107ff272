use std::cmp::Ordering;

use serde_json::{Number, Value};

use crate::{error::{NestedValuesError, Result}, query::{expr::Expr, helpers::Helpers}};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunc {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Avg => "AVG",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
        }
    }

    pub fn create_accumulator(&self) -> Box<dyn Accumulator> {
        match self {
            AggregateFunc::Count => Box::new(CountAcc(0)),
            AggregateFunc::Sum => Box::new(SumAcc::Empty),
            AggregateFunc::Avg => Box::new(AvgAcc { sum: 0.0, count: 0 }),
            AggregateFunc::Min => Box::new(ExtremaAcc { keep: Ordering::Less, current: None }),
            AggregateFunc::Max => Box::new(ExtremaAcc { keep: Ordering::Greater, current: None }),
        }
    }
}

/// An aggregate over the documents of another collection that reference the
/// current one.
///
/// `path` starts with the referring collection (`books`), optionally followed
/// by a column path inside it (`books__pages`). With no inner path only
/// `Count` makes sense: it counts the referring documents.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateCall {
    pub func: AggregateFunc,
    pub path: String,
}

/// Computed column added with `annotate`.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Aggregate(AggregateCall),
    Expr(Expr),
}

impl Annotation {
    pub fn count(path: &str) -> Self {
        Self::aggregate(AggregateFunc::Count, path)
    }

    pub fn sum(path: &str) -> Self {
        Self::aggregate(AggregateFunc::Sum, path)
    }

    pub fn avg(path: &str) -> Self {
        Self::aggregate(AggregateFunc::Avg, path)
    }

    pub fn min(path: &str) -> Self {
        Self::aggregate(AggregateFunc::Min, path)
    }

    pub fn max(path: &str) -> Self {
        Self::aggregate(AggregateFunc::Max, path)
    }

    pub fn aggregate(func: AggregateFunc, path: &str) -> Self {
        Annotation::Aggregate(AggregateCall { func, path: path.to_string() })
    }
}

impl From<Expr> for Annotation {
    fn from(expr: Expr) -> Self {
        Annotation::Expr(expr)
    }
}

/// Running state of one aggregate. Nulls never reach `update`.
pub trait Accumulator {
    fn update(&mut self, value: &Value) -> Result<()>;

    fn finalize(&self) -> Value;
}

struct CountAcc(u64);

impl Accumulator for CountAcc {
    fn update(&mut self, _value: &Value) -> Result<()> {
        self.0 += 1;
        Ok(())
    }

    fn finalize(&self) -> Value {
        Value::from(self.0)
    }
}

// Stays integral until a float shows up.
enum SumAcc {
    Empty,
    Int(i128),
    Float(f64),
}

fn numeric(func: &str, value: &Value) -> Result<Number> {
    match value {
        Value::Number(n) => Ok(n.clone()),
        other => Err(NestedValuesError::Other(format!("{func} got non numeric value {other}"))),
    }
}

impl Accumulator for SumAcc {
    fn update(&mut self, value: &Value) -> Result<()> {
        let n = numeric("SUM", value)?;
        *self = match (&*self, n.as_i64(), n.as_f64()) {
            (SumAcc::Empty, Some(i), _) => SumAcc::Int(i as i128),
            (SumAcc::Int(acc), Some(i), _) => SumAcc::Int(acc + i as i128),
            (SumAcc::Empty, None, Some(f)) => SumAcc::Float(f),
            (SumAcc::Int(acc), None, Some(f)) => SumAcc::Float(*acc as f64 + f),
            (SumAcc::Float(acc), _, Some(f)) => SumAcc::Float(acc + f),
            (_, _, None) => return Err(NestedValuesError::Other("SUM got non finite number".into())),
        };
        Ok(())
    }

    fn finalize(&self) -> Value {
        match self {
            SumAcc::Empty => Value::Null,
            SumAcc::Int(i) => i64::try_from(*i)
                .map(Value::from)
                .unwrap_or_else(|_| Number::from_f64(*i as f64).map(Value::Number).unwrap_or(Value::Null)),
            SumAcc::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        }
    }
}

struct AvgAcc {
    sum: f64,
    count: u64,
}

impl Accumulator for AvgAcc {
    fn update(&mut self, value: &Value) -> Result<()> {
        let n = numeric("AVG", value)?;
        self.sum += n.as_f64().unwrap_or_default();
        self.count += 1;
        Ok(())
    }

    fn finalize(&self) -> Value {
        if self.count == 0 {
            return Value::Null;
        }
        Number::from_f64(self.sum / self.count as f64).map(Value::Number).unwrap_or(Value::Null)
    }
}

struct ExtremaAcc {
    /// `Less` keeps the minimum, `Greater` the maximum.
    keep: Ordering,
    current: Option<Value>,
}

impl Accumulator for ExtremaAcc {
    fn update(&mut self, value: &Value) -> Result<()> {
        let replace = match &self.current {
            None => true,
            Some(current) => match Helpers::compare_values(value, current) {
                Some(ord) => ord == self.keep,
                None => return Err(NestedValuesError::Other("MIN/MAX got mixed value kinds".into())),
            },
        };
        if replace {
            self.current = Some(value.clone());
        }
        Ok(())
    }

    fn finalize(&self) -> Value {
        self.current.clone().unwrap_or(Value::Null)
    }
}
