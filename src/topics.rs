use crate::fields::{get_value, normalize_key, FieldVariants, Record};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TopicStatus {
    Completed,
    InProgress,
    None,
}

impl TopicStatus {
    pub fn is_live(self) -> bool {
        matches!(self, TopicStatus::Completed | TopicStatus::InProgress)
    }

    fn rank(self) -> u8 {
        match self {
            TopicStatus::Completed => 0,
            TopicStatus::InProgress => 1,
            TopicStatus::None => 2,
        }
    }
}

/// Normalized status text -> tag, plus substrings that mark a topic as
/// still in progress.
#[derive(Debug, Clone)]
pub struct StatusVocabulary {
    table: HashMap<String, TopicStatus>,
    in_progress_substrings: Vec<String>,
}

impl Default for StatusVocabulary {
    fn default() -> Self {
        let mut vocab = Self {
            table: HashMap::new(),
            in_progress_substrings: vec!["progress".to_string()],
        };
        for w in ["completed", "done", "finished"] {
            vocab.insert(w, TopicStatus::Completed);
        }
        for w in [
            "in progress",
            "inprogress",
            "ongoing",
            "working",
            "currently doing",
        ] {
            vocab.insert(w, TopicStatus::InProgress);
        }
        vocab
    }
}

impl StatusVocabulary {
    pub fn insert(&mut self, word: &str, status: TopicStatus) {
        let w = normalize_key(word);
        if !w.is_empty() {
            self.table.insert(w, status);
        }
    }

    pub fn add_in_progress_substring(&mut self, s: &str) {
        let s = normalize_key(s);
        if !s.is_empty() && !self.in_progress_substrings.contains(&s) {
            self.in_progress_substrings.push(s);
        }
    }

    pub fn classify(&self, raw: &str) -> TopicStatus {
        let s = normalize_key(raw);
        if s.is_empty() {
            return TopicStatus::None;
        }
        if let Some(st) = self.table.get(&s) {
            return *st;
        }
        if self.in_progress_substrings.iter().any(|p| s.contains(p.as_str())) {
            return TopicStatus::InProgress;
        }
        TopicStatus::None
    }

    /// Sorted words per tag, for `config.get`.
    pub fn words(&self, status: TopicStatus) -> Vec<String> {
        let mut out: Vec<String> = self
            .table
            .iter()
            .filter(|(_, st)| **st == status)
            .map(|(w, _)| w.clone())
            .collect();
        out.sort();
        out
    }

    pub fn in_progress_substrings(&self) -> &[String] {
        &self.in_progress_substrings
    }
}

pub fn classify_topic_status(
    completion: &Record,
    topic: &str,
    vocab: &StatusVocabulary,
) -> TopicStatus {
    let Some(entry) = completion.get(topic).and_then(|v| v.as_object()) else {
        return TopicStatus::None;
    };
    let status = entry
        .get("status")
        .or_else(|| entry.get("Status"))
        .and_then(|v| v.as_str());
    match status {
        Some(s) => vocab.classify(s),
        None => TopicStatus::None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicEntry {
    pub name: String,
    pub status: TopicStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicAggregate {
    pub topics: Vec<TopicEntry>,
    /// True when status-less topics were dropped.
    pub filtered: bool,
}

/// Where topic names are collected from.
pub struct TopicSources<'a> {
    pub groups: &'a [FieldVariants],
    pub skills: &'a FieldVariants,
    pub completion: &'a FieldVariants,
}

/// Case-folded comparison with a raw tiebreak so the order stays total.
pub fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn nested<'a>(record: &'a Record, variants: &FieldVariants) -> Option<&'a Record> {
    get_value(record, variants, None).and_then(|v| v.as_object())
}

pub fn aggregate_topics<'r>(
    record: &'r Record,
    sources: &TopicSources<'_>,
    vocab: &StatusVocabulary,
) -> TopicAggregate {
    let mut seen: HashSet<&'r str> = HashSet::new();
    let mut names: Vec<&'r str> = Vec::new();
    let mut add = |name: &'r str| {
        if !name.is_empty() && seen.insert(name) {
            names.push(name);
        }
    };

    for group in sources.groups {
        if let Some(obj) = nested(record, group) {
            obj.keys().for_each(|k| add(k.as_str()));
        }
    }
    if let Some(Value::Array(items)) = get_value(record, sources.skills, None) {
        items.iter().filter_map(|v| v.as_str()).for_each(&mut add);
    }
    let completion = nested(record, sources.completion);
    if let Some(obj) = completion {
        obj.keys().for_each(|k| add(k.as_str()));
    }

    let mut topics: Vec<TopicEntry> = names
        .into_iter()
        .map(|name| TopicEntry {
            name: name.to_string(),
            status: completion
                .map(|c| classify_topic_status(c, name, vocab))
                .unwrap_or(TopicStatus::None),
        })
        .collect();

    let filtered = topics.iter().any(|t| t.status.is_live());
    if filtered {
        topics.retain(|t| t.status.is_live());
        topics.sort_by(|a, b| {
            a.status
                .rank()
                .cmp(&b.status.rank())
                .then_with(|| collate(&a.name, &b.name))
        });
    } else {
        topics.sort_by(|a, b| collate(&a.name, &b.name));
    }

    TopicAggregate { topics, filtered }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Record {
        v.as_object().cloned().expect("object")
    }

    fn variants(v: &[&str]) -> FieldVariants {
        FieldVariants::new(v.iter().copied()).expect("variants")
    }

    fn aggregate(r: &Record) -> TopicAggregate {
        let groups = vec![
            variants(&["Daily Quiz counts", "Daily Quiz Counts", "dailyQuizCounts"]),
            variants(&["Fortnight Exam Counts", "fortnightExamCounts"]),
        ];
        let skills = variants(&["skills", "Skills"]);
        let completion = variants(&["CourseCompletion", "courseCompletion"]);
        let sources = TopicSources {
            groups: &groups,
            skills: &skills,
            completion: &completion,
        };
        aggregate_topics(r, &sources, &StatusVocabulary::default())
    }

    #[test]
    fn classify_vocabulary_examples() {
        let v = StatusVocabulary::default();
        for s in ["Completed", "completed", "  Completed  ", "done", "finished"] {
            assert_eq!(v.classify(s), TopicStatus::Completed, "{s}");
        }
        for s in ["ongoing", "ACTIVELY IN PROGRESS", "InProgress", "currently doing"] {
            assert_eq!(v.classify(s), TopicStatus::InProgress, "{s}");
        }
        for s in ["N/A", "", "   ", "pending"] {
            assert_eq!(v.classify(s), TopicStatus::None, "{s}");
        }
    }

    #[test]
    fn classify_reads_both_status_spellings_only() {
        let completion = record(json!({
            "React": { "status": "done" },
            "Node.js": { "Status": "working" },
            "Go": { "STATUS": "done" },
            "Rust": { "status": 1 },
            "Java": "completed"
        }));
        let v = StatusVocabulary::default();
        assert_eq!(classify_topic_status(&completion, "React", &v), TopicStatus::Completed);
        assert_eq!(classify_topic_status(&completion, "Node.js", &v), TopicStatus::InProgress);
        assert_eq!(classify_topic_status(&completion, "Go", &v), TopicStatus::None);
        assert_eq!(classify_topic_status(&completion, "Rust", &v), TopicStatus::None);
        assert_eq!(classify_topic_status(&completion, "Java", &v), TopicStatus::None);
        assert_eq!(classify_topic_status(&completion, "Missing", &v), TopicStatus::None);
    }

    #[test]
    fn vocabulary_extends_without_code_changes() {
        let mut v = StatusVocabulary::default();
        assert_eq!(v.classify("Passed"), TopicStatus::None);
        v.insert("passed", TopicStatus::Completed);
        v.add_in_progress_substring("started");
        assert_eq!(v.classify(" PASSED "), TopicStatus::Completed);
        assert_eq!(v.classify("just started"), TopicStatus::InProgress);
    }

    #[test]
    fn single_completed_topic_hides_status_less_ones() {
        let r = record(json!({
            "Daily Quiz Counts": { "Algebra": 1, "Geometry": 2 },
            "skills": ["Calculus"],
            "CourseCompletion": {
                "Statistics": { "status": "Completed" },
                "Algebra": { "status": "N/A" }
            }
        }));
        let agg = aggregate(&r);
        assert!(agg.filtered);
        assert_eq!(
            agg.topics,
            vec![TopicEntry {
                name: "Statistics".into(),
                status: TopicStatus::Completed
            }]
        );
    }

    #[test]
    fn no_status_returns_full_union_sorted() {
        let r = record(json!({
            "dailyQuizCounts": { "zeta": 1, "Beta": 2 },
            "fortnightExamCounts": { "Beta": 3, "alpha": 4 },
            "Skills": ["Gamma", "Beta", 7]
        }));
        let agg = aggregate(&r);
        assert!(!agg.filtered);
        let names: Vec<&str> = agg.topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "Beta", "Gamma", "zeta"]);
    }

    #[test]
    fn completed_sorts_before_in_progress() {
        let r = record(json!({
            "CourseCompletion": {
                "Zebra": { "status": "In Progress" },
                "Apple": { "status": "Completed" },
                "Mango": { "Status": "ongoing" }
            }
        }));
        let names: Vec<String> = aggregate(&r).topics.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Apple", "Mango", "Zebra"]);
    }

    #[test]
    fn topic_names_are_not_normalized_across_sources() {
        let r = record(json!({
            "dailyQuizCounts": { "React": 1 },
            "skills": ["react", "React"]
        }));
        let names: Vec<String> = aggregate(&r).topics.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["React", "react"]);
    }
}
