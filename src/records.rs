use std::path::Path;

use anyhow::Context as _;

use crate::normalize::simplified_name;

pub type AppId = u64;

/// Tri-state card flag. The exported field is "TRUE", "FALSE", or blank;
/// blank means the status has not been determined yet and a future run may
/// retry the fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStatus {
    Unknown,
    Yes,
    No,
}

impl CardStatus {
    pub fn is_known(self) -> bool {
        !matches!(self, CardStatus::Unknown)
    }

    pub fn as_field(self) -> &'static str {
        match self {
            CardStatus::Unknown => "",
            CardStatus::Yes => "TRUE",
            CardStatus::No => "FALSE",
        }
    }

    pub fn from_field(field: &str) -> Option<Self> {
        match field.to_ascii_uppercase().as_str() {
            "" => Some(CardStatus::Unknown),
            "TRUE" => Some(CardStatus::Yes),
            "FALSE" => Some(CardStatus::No),
            _ => None,
        }
    }
}

/// One user-requested title moving through the pipeline.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub simplified: String,
    pub id: Option<AppId>,
    pub cards: CardStatus,
}

impl Entry {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let simplified = simplified_name(&name);
        Self {
            name,
            simplified,
            id: None,
            cards: CardStatus::Unknown,
        }
    }

    /// The 3-column export shape: title, id or blank, tri-state field.
    pub fn fields(&self) -> [String; 3] {
        [
            self.name.clone(),
            self.id.map(|id| id.to_string()).unwrap_or_default(),
            self.cards.as_field().to_owned(),
        ]
    }
}

/// Classification of one input row. A row is only trusted as a previously
/// produced record when it structurally matches the export shape; anything
/// else is treated as one raw title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputRow {
    RawTitle(String),
    Produced {
        name: String,
        id: AppId,
        cards: CardStatus,
    },
}

impl InputRow {
    pub fn into_entry(self) -> Entry {
        match self {
            InputRow::RawTitle(name) => Entry::new(name),
            InputRow::Produced { name, id, cards } => {
                let mut entry = Entry::new(name);
                entry.id = Some(id);
                entry.cards = cards;
                entry
            }
        }
    }
}

/// A produced record has at least 3 fields, an integral second-to-last
/// field, and a tri-state last field (case-insensitive). Everything else
/// falls back to a raw title with the fields rejoined.
pub fn classify_row(fields: &[String]) -> Option<InputRow> {
    if fields.is_empty() || fields.iter().all(|f| f.trim().is_empty()) {
        return None;
    }

    if fields.len() >= 3
        && let Ok(id) = fields[fields.len() - 2].trim().parse::<AppId>()
        && let Some(cards) = CardStatus::from_field(fields[fields.len() - 1].trim())
    {
        let name = fields[..fields.len() - 2].concat();
        return Some(InputRow::Produced { name, id, cards });
    }

    Some(InputRow::RawTitle(fields.concat()))
}

/// Reads an input list: either raw titles (one per row) or rows written by
/// a previous run. Feeding a prior output back in skips the work that run
/// already finished.
pub fn read_entries(path: &Path) -> anyhow::Result<Vec<Entry>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open input list: {}", path.display()))?;

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.context("read input row")?;
        let fields = record
            .iter()
            .map(|field| field.to_owned())
            .collect::<Vec<_>>();
        if let Some(row) = classify_row(&fields) {
            entries.push(row.into_entry());
        }
    }

    Ok(entries)
}
