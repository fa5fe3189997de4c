use csv::{QuoteStyle, WriterBuilder};
use tracing::debug;
use crate::domain::{error::SyncError, models::CustomerProfile};

/// One stockist row. Field order is fixed and must match the rows already
/// stored in the file, otherwise dedup and removal stop lining up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub company: String,
    pub address_line: String,
    pub city: String,
    pub region: String,
    pub postcode: String,
    pub country: String,
    pub phone: String,
    pub email: String,
    pub composite_address: String,
}

impl CsvRow {
    pub fn fields(&self) -> [&str; 9] {
        [
            &self.company,
            &self.address_line,
            &self.city,
            &self.region,
            &self.postcode,
            &self.country,
            &self.phone,
            &self.email,
            &self.composite_address,
        ]
    }

    /// Serializes the row with every field quoted and no line terminator.
    pub fn to_line(&self) -> Result<String, SyncError> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Always)
            .from_writer(Vec::new());

        writer.write_record(self.fields())
            .map_err(|e| SyncError::Internal(format!("failed to encode CSV row: {}", e)))?;

        let bytes = writer.into_inner()
            .map_err(|e| SyncError::Internal(format!("failed to flush CSV row: {}", e)))?;
        let line = String::from_utf8(bytes)
            .map_err(|e| SyncError::Internal(e.to_string()))?;

        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Builds the canonical row for a customer.
///
/// The composite address deliberately leaves out the country.
pub fn encode_row(profile: &CustomerProfile, default_country: &str) -> CsvRow {
    let address = &profile.address;
    let company = profile.company.clone().unwrap_or_else(|| profile.full_name());
    let address_line = address.street.clone().unwrap_or_default();
    let city = address.city.clone().unwrap_or_default();
    let region = address.region.clone().unwrap_or_default();
    let postcode = address.postal_code.clone().unwrap_or_default();
    let country = address.country.clone().unwrap_or_else(|| default_country.to_string());
    let composite_address = format!("{}, {}, {}, {}", address_line, city, postcode, region);

    CsvRow {
        company,
        address_line,
        city,
        region,
        postcode,
        country,
        phone: profile.phone.clone().unwrap_or_default(),
        email: profile.email.clone().unwrap_or_default(),
        composite_address,
    }
}

/// Escapes a value the way `CsvRow::to_line` stores it, so substring
/// searches over the file line up with what was written.
fn as_stored(value: &str) -> String {
    value.replace('"', "\"\"")
}

/// The stockist file as an ordered list of raw lines.
///
/// Lines are never re-encoded: blank lines and anything that is not a quoted
/// record go back out exactly as they came in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvDocument {
    lines: Vec<String>,
}

impl CsvDocument {
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        debug!("Decoded CSV document: {} lines", lines.len());
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    /// Drops trailing whitespace from the document, then adds `line` at the end.
    pub fn append_line(&mut self, line: &str) {
        while self.lines.last().is_some_and(|l| l.trim().is_empty()) {
            self.lines.pop();
        }
        if let Some(last) = self.lines.last_mut() {
            let trimmed_len = last.trim_end().len();
            last.truncate(trimmed_len);
        }
        self.lines.push(line.to_string());
    }

    /// Keeps the lines for which `keep` returns true, in order. Returns how many were dropped.
    pub fn retain_lines<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let before = self.lines.len();
        self.lines.retain(|l| keep(l));
        before - self.lines.len()
    }
}

/// True when the customer already appears in the document.
///
/// Matches the email verbatim or escaped as it is stored, anywhere in the
/// text, so an email sitting in an unrelated field also counts.
pub fn matches_for_dedup(document: &CsvDocument, profile: &CustomerProfile, encoded_row: &str) -> bool {
    match profile.email.as_deref() {
        Some(email) if !email.is_empty() => {
            document.contains(email) || document.contains(&as_stored(email))
        }
        // Departs from the old handler, where an empty email matched every
        // file and such customers were never added: compare the whole row.
        _ => document.lines().iter().any(|l| l.trim_end() == encoded_row),
    }
}

/// Case-insensitive substring match on the full name or the street address.
///
/// Loose on purpose: short or shared names and addresses can remove more than
/// one row. Blank needles never match. Needles are tried both verbatim and
/// with quotes doubled as the row writer stores them.
pub fn matches_for_removal(line: &str, profile: &CustomerProfile) -> bool {
    let lower = line.to_lowercase();
    let full_name = profile.full_name().trim().to_lowercase();
    let street = profile.address.street.as_deref().unwrap_or("").trim().to_lowercase();

    [full_name, street].iter().filter(|needle| !needle.is_empty()).any(|needle| {
        lower.contains(needle.as_str()) || lower.contains(&as_stored(needle))
    })
}
