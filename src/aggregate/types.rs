use bson::{Bson, Document as BsonDocument, doc};

use crate::errors::DbError;
use crate::query::{Filter, SortSpec, filter_to_document};

pub(crate) const MAX_STAGES: usize = 32;

/// A value computed per input document.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `"$path"`; a missing field evaluates to `null`.
    Field(String),
    Literal(Bson),
    /// `{$subtract: [a, b]}`
    Subtract(Box<Expr>, Box<Expr>),
    /// `{$mod: [a, b]}`; both operands must be integers.
    Mod(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn field(path: impl Into<String>) -> Self {
        Self::Field(path.into())
    }

    pub fn literal(v: impl Into<Bson>) -> Self {
        Self::Literal(v.into())
    }

    #[must_use]
    pub fn subtract(a: Self, b: Self) -> Self {
        Self::Subtract(Box::new(a), Box::new(b))
    }

    #[must_use]
    pub fn modulo(a: Self, b: Self) -> Self {
        Self::Mod(Box::new(a), Box::new(b))
    }

    #[must_use]
    pub fn to_bson(&self) -> Bson {
        match self {
            Self::Field(p) => Bson::String(format!("${p}")),
            Self::Literal(Bson::String(s)) if s.starts_with('$') => {
                Bson::Document(doc! {"$literal": s.clone()})
            }
            Self::Literal(v) => v.clone(),
            Self::Subtract(a, b) => Bson::Document(doc! {"$subtract": [a.to_bson(), b.to_bson()]}),
            Self::Mod(a, b) => Bson::Document(doc! {"$mod": [a.to_bson(), b.to_bson()]}),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// Mean of numeric inputs; `null` when the group saw none.
    Avg(Expr),
    Sum(Expr),
    /// Collects values in input order.
    Push(Expr),
}

impl Accumulator {
    #[must_use]
    pub fn to_bson(&self) -> Bson {
        let (op, e) = match self {
            Self::Avg(e) => ("$avg", e),
            Self::Sum(e) => ("$sum", e),
            Self::Push(e) => ("$push", e),
        };
        let mut d = BsonDocument::new();
        d.insert(op, e.to_bson());
        Bson::Document(d)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectField {
    Include,
    Exclude,
    Computed(Expr),
}

#[derive(Debug, Clone)]
pub enum Stage {
    Match(Filter),
    Project(Vec<(String, ProjectField)>),
    Group { id: Expr, fields: Vec<(String, Accumulator)> },
    Sort(Vec<SortSpec>),
    Skip(usize),
    Limit(usize),
}

impl Stage {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Match(_) => "$match",
            Self::Project(_) => "$project",
            Self::Group { .. } => "$group",
            Self::Sort(_) => "$sort",
            Self::Skip(_) => "$skip",
            Self::Limit(_) => "$limit",
        }
    }

    /// Renders the stage as the single-key document a document database accepts.
    #[must_use]
    pub fn to_document(&self) -> BsonDocument {
        let body = match self {
            Self::Match(f) => Bson::Document(filter_to_document(f)),
            Self::Project(fields) => {
                let mut d = BsonDocument::new();
                for (name, pf) in fields {
                    let v = match pf {
                        ProjectField::Include => Bson::Int32(1),
                        ProjectField::Exclude => Bson::Int32(0),
                        ProjectField::Computed(e) => e.to_bson(),
                    };
                    d.insert(name.clone(), v);
                }
                Bson::Document(d)
            }
            Self::Group { id, fields } => {
                let mut d = doc! {"_id": id.to_bson()};
                for (name, acc) in fields {
                    d.insert(name.clone(), acc.to_bson());
                }
                Bson::Document(d)
            }
            Self::Sort(specs) => {
                let mut d = BsonDocument::new();
                for s in specs {
                    d.insert(s.field.clone(), Bson::Int32(s.order.as_i32()));
                }
                Bson::Document(d)
            }
            Self::Skip(n) => Bson::Int64(i64::try_from(*n).unwrap_or(i64::MAX)),
            Self::Limit(n) => Bson::Int64(i64::try_from(*n).unwrap_or(i64::MAX)),
        };
        let mut out = BsonDocument::new();
        out.insert(self.name(), body);
        out
    }

    fn validate(&self) -> Result<(), DbError> {
        match self {
            Self::Match(_) | Self::Skip(_) => Ok(()),
            Self::Limit(0) => Err(DbError::InvalidInput("$limit must be positive".into())),
            Self::Limit(_) => Ok(()),
            Self::Sort(specs) if specs.is_empty() => {
                Err(DbError::InvalidInput("$sort requires at least one key".into()))
            }
            Self::Sort(specs) => specs.iter().try_for_each(|s| check_path(&s.field)),
            Self::Project(fields) => {
                if fields.is_empty() {
                    return Err(DbError::InvalidInput("$project requires at least one field".into()));
                }
                let mut includes = false;
                let mut excludes = false;
                for (name, pf) in fields {
                    check_path(name)?;
                    match pf {
                        ProjectField::Exclude if name != "_id" => excludes = true,
                        ProjectField::Exclude => {}
                        ProjectField::Include | ProjectField::Computed(_) => includes = true,
                    }
                }
                if includes && excludes {
                    return Err(DbError::InvalidInput(
                        "$project cannot mix inclusion and exclusion".into(),
                    ));
                }
                Ok(())
            }
            Self::Group { fields, .. } => {
                for (name, _) in fields {
                    if name == "_id" || name.contains('.') {
                        return Err(DbError::InvalidInput(format!(
                            "invalid $group output field {name:?}"
                        )));
                    }
                    check_path(name)?;
                }
                Ok(())
            }
        }
    }
}

/// Field names must be non-empty, must not start with `$` and must not contain NUL.
pub(crate) fn check_path(name: &str) -> Result<(), DbError> {
    if name.is_empty() || name.starts_with('$') || name.contains('\0') {
        return Err(DbError::InvalidInput(format!("invalid field name {name:?}")));
    }
    Ok(())
}

/// An ordered list of stages, applied in sequence to a record stream.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    #[must_use]
    pub fn group(self, id: Expr, fields: Vec<(&str, Accumulator)>) -> Self {
        let fields = fields.into_iter().map(|(n, a)| (n.to_string(), a)).collect();
        self.stage(Stage::Group { id, fields })
    }

    #[must_use]
    pub fn project(self, fields: Vec<(&str, ProjectField)>) -> Self {
        self.stage(Stage::Project(fields.into_iter().map(|(n, p)| (n.to_string(), p)).collect()))
    }

    #[must_use]
    pub fn sort(self, specs: Vec<SortSpec>) -> Self {
        self.stage(Stage::Sort(specs))
    }

    #[must_use]
    pub fn limit(self, n: usize) -> Self {
        self.stage(Stage::Limit(n))
    }

    /// # Errors
    /// Returns `InvalidInput` describing the first malformed stage.
    pub fn validate(&self) -> Result<(), DbError> {
        if self.stages.len() > MAX_STAGES {
            return Err(DbError::InvalidInput(format!(
                "pipeline has {} stages (max {MAX_STAGES})",
                self.stages.len()
            )));
        }
        self.stages.iter().try_for_each(Stage::validate)
    }

    /// Declarative description: one document per stage.
    #[must_use]
    pub fn to_bson(&self) -> Vec<BsonDocument> {
        self.stages.iter().map(Stage::to_document).collect()
    }
}
