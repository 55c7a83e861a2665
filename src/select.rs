//! Selection and deduplication of the records extracted from one email.

use crate::record::ExtractedRecord;

/// Identity of a record for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    email: String,
    phone_digits: String,
    city: String,
    date_debut: String,
    date_fin: String,
}

pub fn dedup_key(record: &ExtractedRecord) -> DedupKey {
    DedupKey {
        email: record.email.trim().to_lowercase(),
        phone_digits: record.telephone.chars().filter(char::is_ascii_digit).collect(),
        city: record.ville.trim().to_lowercase(),
        date_debut: record.date_debut.trim().to_string(),
        date_fin: record.date_fin.trim().to_string(),
    }
}

/// Completeness score: contact and where/when fields weigh double.
pub fn score(record: &ExtractedRecord) -> u32 {
    let present = |s: &str| !s.trim().is_empty();
    [
        (present(&record.email), 2),
        (present(&record.telephone), 2),
        (present(&record.ville), 2),
        (present(&record.date_debut), 2),
        (present(&record.date_fin), 1),
        (present(&record.type_vehicule), 1),
        (present(&record.nb_personnes), 1),
    ]
    .iter()
    .filter(|(hit, _)| *hit)
    .map(|(_, weight)| weight)
    .sum()
}

/// Drop records whose key was already seen, keeping first-seen order.
pub fn dedup(records: Vec<ExtractedRecord>) -> Vec<ExtractedRecord> {
    let mut seen: Vec<DedupKey> = Vec::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| {
            let key = dedup_key(record);
            if seen.contains(&key) {
                false
            } else {
                seen.push(key);
                true
            }
        })
        .collect()
}

/// Deduplicate, then keep only the best record unless `multi_record` is set.
///
/// Ties go to the longer `infos_libres`, then to the earlier record.
pub fn select_records(records: Vec<ExtractedRecord>, multi_record: bool) -> Vec<ExtractedRecord> {
    let unique = dedup(records);
    if multi_record || unique.len() <= 1 {
        return unique;
    }

    let mut best: Option<(u32, usize, ExtractedRecord)> = None;
    for record in unique {
        let rank = (score(&record), record.infos_libres.chars().count());
        let better = match &best {
            Some((s, len, _)) => rank > (*s, *len),
            None => true,
        };
        if better {
            best = Some((rank.0, rank.1, record));
        }
    }
    best.map(|(_, _, record)| vec![record]).unwrap_or_default()
}
