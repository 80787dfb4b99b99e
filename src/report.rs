use crate::fields::{self, FieldVariants, MatchKind, Record};
use crate::topics::{self, StatusVocabulary, TopicSources, TopicStatus};
use serde::Serialize;
use serde_json::{Map, Value};

pub const SKILLS: &str = "skills";
pub const COURSE_COMPLETION: &str = "courseCompletion";

/// Logical report fields and the spreadsheet spellings each one has had.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    metrics: Vec<(String, FieldVariants)>,
    skills: FieldVariants,
    completion: FieldVariants,
    topic_fields: Vec<String>,
}

impl Default for FieldCatalog {
    fn default() -> Self {
        let metrics = vec![
            (
                "dailyQuizCounts",
                FieldVariants::builtin(&[
                    "Daily Quiz counts",
                    "Daily Quiz Counts",
                    "dailyQuizCounts",
                ]),
            ),
            (
                "dailyQuizScores",
                FieldVariants::builtin(&[
                    "Daily Quiz score Average in %",
                    "Daily Quiz Score Average in %",
                    "dailyQuizScores",
                ]),
            ),
            (
                "fortnightExamCounts",
                FieldVariants::builtin(&[
                    "Fortnight Exam Counts",
                    "Fortnight Exam counts",
                    "fortnightExamCounts",
                ]),
            ),
            (
                "fortnightExamScores",
                FieldVariants::builtin(&[
                    "Fortnight Exam Score Average in %",
                    "Fortnight Exam score Average in %",
                    "fortnightExamScores",
                ]),
            ),
            (
                "courseExamScores",
                FieldVariants::builtin(&[
                    "Course Exam Score in %",
                    "Course Exam score in %",
                    "courseExamScores",
                ]),
            ),
        ];
        let topic_fields = metrics.iter().map(|(n, _)| n.to_string()).collect();
        Self {
            metrics: metrics
                .into_iter()
                .map(|(n, v)| (n.to_string(), v))
                .collect(),
            skills: FieldVariants::builtin(&["skills", "Skills"]),
            completion: FieldVariants::builtin(&[
                "CourseCompletion",
                "Course Completion",
                "courseCompletion",
            ]),
            topic_fields,
        }
    }
}

impl FieldCatalog {
    pub fn get(&self, name: &str) -> Option<&FieldVariants> {
        match name {
            SKILLS => Some(&self.skills),
            COURSE_COMPLETION => Some(&self.completion),
            _ => self
                .metrics
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v),
        }
    }

    pub fn upsert(&mut self, name: &str, variants: FieldVariants) {
        match name {
            SKILLS => self.skills = variants,
            COURSE_COMPLETION => self.completion = variants,
            _ => match self.metrics.iter_mut().find(|(n, _)| n == name) {
                Some(slot) => slot.1 = variants,
                None => self.metrics.push((name.to_string(), variants)),
            },
        }
    }

    /// Topic groups must name per-topic metric fields already in the catalog.
    pub fn set_topic_fields(&mut self, names: Vec<String>) -> Result<(), String> {
        for n in &names {
            if n == SKILLS || n == COURSE_COMPLETION {
                return Err(format!("{n} is scanned separately and cannot be a topic field"));
            }
            if !self.metrics.iter().any(|(m, _)| m == n) {
                return Err(format!("unknown topic field: {n}"));
            }
        }
        self.topic_fields = names;
        Ok(())
    }

    pub fn topic_fields(&self) -> &[String] {
        &self.topic_fields
    }

    pub fn skills(&self) -> &FieldVariants {
        &self.skills
    }

    pub fn completion(&self) -> &FieldVariants {
        &self.completion
    }

    /// Every field in catalog order: metrics, then skills and completion.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FieldVariants)> {
        self.metrics
            .iter()
            .map(|(n, v)| (n.as_str(), v))
            .chain([(SKILLS, &self.skills), (COURSE_COMPLETION, &self.completion)])
    }

    pub fn topic_groups(&self) -> Vec<FieldVariants> {
        self.topic_fields
            .iter()
            .filter_map(|n| self.get(n).cloned())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedField {
    pub field: String,
    pub key: String,
    #[serde(rename = "match")]
    pub kind: MatchKind,
    pub exists: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRow {
    pub topic: String,
    pub status: TopicStatus,
    pub metrics: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRowsModel {
    pub rows: Vec<TopicRow>,
    pub filtered: bool,
    pub fields: Vec<ResolvedField>,
}

pub fn resolve_catalog(record: &Record, catalog: &FieldCatalog) -> Vec<ResolvedField> {
    catalog
        .entries()
        .map(|(name, variants)| {
            let r = fields::resolve(record, variants);
            ResolvedField {
                field: name.to_string(),
                exists: record.contains_key(&r.key),
                key: r.key,
                kind: r.kind,
            }
        })
        .collect()
}

pub fn aggregate(
    record: &Record,
    catalog: &FieldCatalog,
    groups: &[FieldVariants],
    vocab: &StatusVocabulary,
) -> topics::TopicAggregate {
    let sources = TopicSources {
        groups,
        skills: catalog.skills(),
        completion: catalog.completion(),
    };
    topics::aggregate_topics(record, &sources, vocab)
}

/// One row per aggregated topic with that topic's value in every metric group.
pub fn topic_rows(
    record: &Record,
    catalog: &FieldCatalog,
    vocab: &StatusVocabulary,
) -> TopicRowsModel {
    let groups = catalog.topic_groups();
    let agg = aggregate(record, catalog, &groups, vocab);

    let rows = agg
        .topics
        .into_iter()
        .map(|t| {
            let mut metrics = Map::new();
            for name in catalog.topic_fields() {
                let value = catalog
                    .get(name)
                    .and_then(|v| fields::get_value(record, v, Some(t.name.as_str())))
                    .cloned()
                    .unwrap_or(Value::Null);
                metrics.insert(name.clone(), value);
            }
            TopicRow {
                topic: t.name,
                status: t.status,
                metrics,
            }
        })
        .collect();

    TopicRowsModel {
        rows,
        filtered: agg.filtered,
        fields: resolve_catalog(record, catalog),
    }
}
