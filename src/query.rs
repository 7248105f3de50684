//! Backend-agnostic query model.
//!
//! A [`QueryConfig`] is the accumulated state of a query builder: conjunctive
//! predicates, at most one ordering, pagination and fetch options. Backends
//! translate it into their native execution; the matching and ordering rules
//! here are shared by all of them.

use std::cmp::Ordering;
use std::fmt;

use log::warn;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::value::{Entity, Value};

/// Comparison applied by a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, AsRefStr, EnumString, EnumIter)]
pub enum Operator {
    #[default]
    #[strum(to_string = "=", serialize = "==")]
    Eq,
    #[strum(to_string = ">=")]
    Ge,
    #[strum(to_string = ">")]
    Gt,
    #[strum(to_string = "<=")]
    Le,
    #[strum(to_string = "<")]
    Lt,
}

impl Operator {
    /// Parses an operator symbol. Unrecognised symbols fall back to
    /// [`Operator::Eq`].
    ///
    /// ```
    /// use datastone::query::Operator;
    ///
    /// assert_eq!(Operator::parse(">="), Operator::Ge);
    /// assert_eq!(Operator::parse("~"), Operator::Eq);
    /// ```
    pub fn parse(symbol: &str) -> Self {
        symbol.trim().parse().unwrap_or_else(|_| {
            warn!("unknown filter operator {symbol:?}, treating as equality");
            Operator::Eq
        })
    }

    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Ge => ordering != Ordering::Less,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Le => ordering != Ordering::Greater,
            Operator::Lt => ordering == Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl Predicate {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// A missing property never matches. A list property matches when any of
    /// its elements does; a list operand is compared as a whole.
    pub fn matches(&self, entity: &Entity) -> bool {
        match (entity.get(&self.field), &self.value) {
            (None, _) => false,
            (Some(Value::List(_)), Value::List(_)) => self.test(entity.get(&self.field)),
            (Some(Value::List(items)), _) => items.iter().any(|item| self.test(Some(item))),
            (found, _) => self.test(found),
        }
    }

    fn test(&self, found: Option<&Value>) -> bool {
        found.is_some_and(|v| self.operator.accepts(v.compare(&self.value)))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.field, self.operator, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: String,
    pub direction: Direction,
}

impl Order {
    /// Compares two entities on the ordered field. Callers must have already
    /// excluded entities lacking the field.
    pub fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        let ordering = match (a.get(&self.field), b.get(&self.field)) {
            (Some(x), Some(y)) => x.compare(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        match self.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Fetch identifiers only; payloads are not decoded when avoidable.
    pub keys_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryConfig {
    pub predicates: Vec<Predicate>,
    pub order: Option<Order>,
    pub pagination: Pagination,
    pub fetch_options: FetchOptions,
}

impl QueryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a conjunctive predicate.
    ///
    /// ```
    /// use datastone::query::{Operator, QueryConfig};
    ///
    /// let config = QueryConfig::new()
    ///     .with_filter("age", Operator::Ge, 18)
    ///     .with_filter("name", Operator::Eq, "ada");
    /// assert_eq!(config.predicates.len(), 2);
    /// ```
    pub fn with_filter(
        mut self,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.predicates.push(Predicate::new(field, operator, value));
        self
    }

    /// Replace the ordering.
    ///
    /// ```
    /// use datastone::query::{Direction, QueryConfig};
    ///
    /// let config = QueryConfig::new()
    ///     .ordered_by("name", Direction::Ascending)
    ///     .ordered_by("age", Direction::Descending);
    /// let order = config.order.unwrap();
    /// assert_eq!(order.field, "age");
    /// assert_eq!(order.direction, Direction::Descending);
    /// ```
    pub fn ordered_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.pagination.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.pagination.offset = Some(offset);
        self
    }

    pub fn keys_only(mut self) -> Self {
        self.fetch_options.keys_only = true;
        self
    }

    /// Whether an entity satisfies every predicate and, when ordered, carries
    /// the ordered field.
    pub fn admits(&self, entity: &Entity) -> bool {
        let ordered = self
            .order
            .as_ref()
            .is_none_or(|order| entity.get(&order.field).is_some());
        ordered && self.predicates.iter().all(|p| p.matches(entity))
    }

    /// Whether evaluating the query needs record payloads at all.
    pub fn needs_payload(&self) -> bool {
        !self.predicates.is_empty() || self.order.is_some() || !self.fetch_options.keys_only
    }
}

impl fmt::Display for QueryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filters: Vec<String> = self.predicates.iter().map(|p| p.to_string()).collect();
        write!(f, "filters=[{}]", filters.join(" AND "))?;
        if let Some(order) = &self.order {
            write!(f, " order={} {}", order.field, order.direction)?;
        }
        if let Some(offset) = self.pagination.offset {
            write!(f, " offset={offset}")?;
        }
        if let Some(limit) = self.pagination.limit {
            write!(f, " limit={limit}")?;
        }
        if self.fetch_options.keys_only {
            f.write_str(" keys_only")?;
        }
        Ok(())
    }
}
