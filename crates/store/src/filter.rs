use strix_core::{FieldValue, Record};

/// Comparison operator of a field predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Exact, case-sensitive equality.
    Eq,
}

/// A single comparison against a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `path op value`. A dotted path fans out over list fields and the
    /// predicate holds if any reached value matches.
    Field {
        path: String,
        op: Operator,
        value: FieldValue,
    },
    /// Every condition holds on the *same* element of the list at `list`.
    Element {
        list: String,
        conditions: Vec<(String, FieldValue)>,
    },
}

impl Predicate {
    /// Test if a record satisfies this predicate. Absent fields never match.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::Field { path, op, value } => record
                .resolve(path)
                .into_iter()
                .any(|found| op.compare(found, value)),
            Predicate::Element { list, conditions } => record
                .resolve(list)
                .into_iter()
                .flat_map(elements)
                .any(|element| {
                    conditions.iter().all(|(key, expected)| {
                        element
                            .get(key)
                            .is_some_and(|found| Operator::Eq.compare(found, expected))
                    })
                }),
        }
    }
}

impl Operator {
    fn compare(&self, found: &FieldValue, expected: &FieldValue) -> bool {
        match self {
            // A list of scalars (aliases, platforms) equals a value it contains.
            Operator::Eq => match found {
                FieldValue::List(items) if !matches!(expected, FieldValue::List(_)) => {
                    items.iter().any(|item| item == expected)
                }
                _ => found == expected,
            },
        }
    }
}

fn elements(value: &FieldValue) -> Vec<&strix_core::Fields> {
    match value {
        FieldValue::List(items) => items.iter().filter_map(FieldValue::as_object).collect(),
        FieldValue::Object(fields) => vec![fields],
        _ => Vec::new(),
    }
}

/// Conjunction of predicates. An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality predicate on a (possibly dotted) field path.
    pub fn eq(mut self, path: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.predicates.push(Predicate::Field {
            path: path.into(),
            op: Operator::Eq,
            value: value.into(),
        });
        self
    }

    /// Filter by record `type`.
    pub fn record_type(self, record_type: impl Into<String>) -> Self {
        self.eq("type", record_type.into())
    }

    /// Require one element of `list` to satisfy all `conditions` at once.
    pub fn element<K, V>(mut self, list: impl Into<String>, conditions: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.predicates.push(Predicate::Element {
            list: list.into(),
            conditions: conditions
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        });
        self
    }

    /// Append every predicate of `other`.
    pub fn and(mut self, other: Filter) -> Self {
        self.predicates.extend(other.predicates);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Test if a record matches every predicate.
    pub fn matches(&self, record: &Record) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }
}

impl From<Vec<Predicate>> for Filter {
    fn from(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }
}
