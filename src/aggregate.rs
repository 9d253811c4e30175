//! # Aggregator
//! Derives the dashboard views from a topic's stored records.
//!
//! Every view is recomputed from scratch on each call; nothing is cached or
//! persisted. Empty input yields empty views, which callers read as
//! "no data yet for this topic".

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::record::{parse_sort_key_time, sort_key_timestamp, ArticleRecord};
use crate::sentiment::SentimentLabel;

/// Length cap for `top_phrases`, `top_domains` and `headlines`.
pub const TOP_K: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhraseCount {
    pub phrase: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainCount {
    pub domain: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub count: usize,
}

/// One point of the sentiment-over-time line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimePoint {
    /// Display label, US short date (`3/7/2025`).
    pub date: String,
    /// Timestamp portion of the record's sort key.
    pub timestamp: String,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Headline {
    pub article_id: String,
    pub title: String,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateView {
    pub sentiment_counts: BTreeMap<SentimentLabel, usize>,
    pub top_phrases: Vec<PhraseCount>,
    pub time_series: Vec<TimePoint>,
    pub top_domains: Vec<DomainCount>,
    /// Unordered; consumers must not rely on position.
    pub country_counts: Vec<CountryCount>,
    pub headlines: Vec<Headline>,
}

impl AggregateView {
    pub fn is_empty(&self) -> bool {
        self.sentiment_counts.is_empty() && self.time_series.is_empty()
    }
}

pub fn aggregate(records: &[ArticleRecord]) -> AggregateView {
    let chronological = chronological(records);

    AggregateView {
        sentiment_counts: sentiment_counts(records),
        top_phrases: top_phrases(records),
        time_series: chronological.iter().map(|r| time_point(r)).collect(),
        top_domains: top_domains(records),
        country_counts: country_counts(records),
        headlines: chronological
            .iter()
            .take(TOP_K)
            .map(|r| Headline {
                article_id: r.article_id.to_string(),
                title: r.title.clone(),
                source_url: r.source_url.clone(),
                domain: r.domain.clone(),
            })
            .collect(),
    }
}

pub fn sentiment_counts(records: &[ArticleRecord]) -> BTreeMap<SentimentLabel, usize> {
    let mut m = BTreeMap::new();
    for r in records {
        *m.entry(r.sentiment_label).or_insert(0) += 1;
    }
    m
}

pub fn top_phrases(records: &[ArticleRecord]) -> Vec<PhraseCount> {
    let phrases = records
        .iter()
        .flat_map(|r| r.key_phrases.iter().map(String::as_str));
    top_k(count_first_seen(phrases), TOP_K)
        .into_iter()
        .map(|(phrase, count)| PhraseCount { phrase, count })
        .collect()
}

pub fn top_domains(records: &[ArticleRecord]) -> Vec<DomainCount> {
    let domains = records.iter().filter_map(|r| r.domain.as_deref());
    top_k(count_first_seen(domains), TOP_K)
        .into_iter()
        .map(|(domain, count)| DomainCount { domain, count })
        .collect()
}

pub fn country_counts(records: &[ArticleRecord]) -> Vec<CountryCount> {
    let countries = records.iter().filter_map(|r| r.source_country.as_deref());
    count_first_seen(countries)
        .into_iter()
        .map(|(country, count)| CountryCount { country, count })
        .collect()
}

pub fn time_series(records: &[ArticleRecord]) -> Vec<TimePoint> {
    chronological(records).into_iter().map(time_point).collect()
}

/// Records in ascending sort-key timestamp order. The sort is stable, so
/// records sharing a timestamp keep their input order; unparseable stamps
/// go first.
fn chronological(records: &[ArticleRecord]) -> Vec<&ArticleRecord> {
    let mut v: Vec<(Option<chrono::DateTime<chrono::Utc>>, &ArticleRecord)> = records
        .iter()
        .map(|r| (parse_sort_key_time(&r.sort_key), r))
        .collect();
    v.sort_by(|a, b| a.0.cmp(&b.0));
    v.into_iter().map(|(_, r)| r).collect()
}

fn time_point(r: &ArticleRecord) -> TimePoint {
    let timestamp = sort_key_timestamp(&r.sort_key).to_string();
    let date = match parse_sort_key_time(&r.sort_key) {
        Some(dt) => dt.format("%-m/%-d/%Y").to_string(),
        None => timestamp.clone(),
    };
    TimePoint {
        date,
        timestamp,
        score: r.raw_sentiment_score,
    }
}

/// Occurrence counts in first-seen order.
fn count_first_seen<'a>(items: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut out: Vec<(String, usize)> = Vec::new();
    for it in items {
        match index.get(it) {
            Some(&i) => out[i].1 += 1,
            None => {
                index.insert(it, out.len());
                out.push((it.to_string(), 1));
            }
        }
    }
    out
}

/// Descending by count; the stable sort keeps first-seen order among ties.
fn top_k(mut counts: Vec<(String, usize)>, k: usize) -> Vec<(String, usize)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(k);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SentimentScore;
    use rand::seq::SliceRandom;
    use uuid::Uuid;

    fn rec(ts: &str, score: i32, phrases: &[&str], domain: Option<&str>, country: Option<&str>) -> ArticleRecord {
        ArticleRecord {
            topic: "Tesla".into(),
            sort_key: format!("{ts}_{}", Uuid::new_v4().simple()),
            article_id: Uuid::new_v4(),
            title: format!("title {ts}"),
            source_url: format!("https://x/{ts}"),
            domain: domain.map(str::to_string),
            source_country: country.map(str::to_string),
            sentiment_label: SentimentLabel::from_score(score),
            raw_sentiment_score: score,
            sentiment_score: SentimentScore::default(),
            key_phrases: phrases.iter().map(|s| s.to_string()).collect(),
            entities: vec![],
        }
    }

    fn sample() -> Vec<ArticleRecord> {
        vec![
            rec("2025-03-07T10:00:00.000Z", 3, &["good"], Some("a.com"), Some("US")),
            rec("2025-03-05T10:00:00.000Z", -2, &["bad", "bad"], Some("a.com"), Some("US")),
            rec("2025-03-06T10:00:00.000Z", 0, &[], Some("b.com"), Some("IN")),
            rec("2025-03-08T10:00:00.000Z", 5, &["good", "great"], None, None),
        ]
    }

    #[test]
    fn empty_input_gives_empty_views() {
        let v = aggregate(&[]);
        assert!(v.is_empty());
        assert_eq!(v, AggregateView::default());
    }

    #[test]
    fn sentiment_counts_skip_absent_labels() {
        let recs = vec![
            rec("2025-03-05T10:00:00.000Z", 1, &[], None, None),
            rec("2025-03-05T11:00:00.000Z", 2, &[], None, None),
        ];
        let c = sentiment_counts(&recs);
        assert_eq!(c.len(), 1);
        assert_eq!(c[&SentimentLabel::Positive], 2);
        assert!(!c.contains_key(&SentimentLabel::Neutral));
    }

    #[test]
    fn domains_ranked_with_absent_skipped() {
        let recs = vec![
            rec("2025-03-05T10:00:00.000Z", 0, &[], Some("a.com"), None),
            rec("2025-03-05T10:00:01.000Z", 0, &[], Some("a.com"), None),
            rec("2025-03-05T10:00:02.000Z", 0, &[], Some("b.com"), None),
            rec("2025-03-05T10:00:03.000Z", 0, &[], None, None),
        ];
        let d = top_domains(&recs);
        assert_eq!(
            d,
            vec![
                DomainCount { domain: "a.com".into(), count: 2 },
                DomainCount { domain: "b.com".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn phrases_count_within_and_across_records_and_break_ties_by_first_seen() {
        let recs = vec![
            rec("2025-03-05T10:00:00.000Z", 0, &["z", "bad", "bad"], None, None),
            rec("2025-03-05T10:00:01.000Z", 0, &["a", "y", "good", "x", "w"], None, None),
        ];
        let p = top_phrases(&recs);
        let got: Vec<(&str, usize)> = p.iter().map(|p| (p.phrase.as_str(), p.count)).collect();
        assert_eq!(got, vec![("bad", 2), ("z", 1), ("a", 1), ("y", 1), ("good", 1)]);
    }

    #[test]
    fn top_lists_never_exceed_five() {
        let recs: Vec<ArticleRecord> = (0..12)
            .map(|i| {
                let ts = format!("2025-03-05T10:00:{i:02}.000Z");
                let ph = format!("p{i}");
                let dom = format!("d{i}.com");
                rec(&ts, 0, &[ph.as_str()], Some(dom.as_str()), Some("US"))
            })
            .collect();
        let v = aggregate(&recs);
        assert_eq!(v.top_phrases.len(), TOP_K);
        assert_eq!(v.top_domains.len(), TOP_K);
        assert_eq!(v.headlines.len(), TOP_K);
        assert_eq!(v.time_series.len(), 12);
        assert_eq!(v.country_counts, vec![CountryCount { country: "US".into(), count: 12 }]);
    }

    #[test]
    fn time_series_is_chronological_with_display_dates() {
        let v = aggregate(&sample());
        let scores: Vec<i32> = v.time_series.iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![-2, 0, 3, 5]);
        assert_eq!(v.time_series[0].date, "3/5/2025");
        assert_eq!(v.time_series[0].timestamp, "2025-03-05T10:00:00.000Z");
        assert_eq!(v.headlines[0].title, "title 2025-03-05T10:00:00.000Z");
    }

    #[test]
    fn same_timestamp_keeps_input_order() {
        let recs = vec![
            rec("2025-03-05T10:00:00.000Z", 1, &[], None, None),
            rec("2025-03-05T10:00:00.000Z", 2, &[], None, None),
            rec("2025-03-04T10:00:00.000Z", 3, &[], None, None),
            rec("2025-03-05T10:00:00.000Z", 4, &[], None, None),
        ];
        let scores: Vec<i32> = time_series(&recs).iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![3, 1, 2, 4]);
    }

    #[test]
    fn unparseable_timestamps_sort_first_and_show_raw() {
        let mut odd = rec("2025-03-05T10:00:00.000Z", 9, &[], None, None);
        odd.sort_key = "legacy_key".into();
        let recs = vec![rec("2025-03-05T10:00:00.000Z", 1, &[], None, None), odd];
        let ts = time_series(&recs);
        assert_eq!(ts[0].score, 9);
        assert_eq!(ts[0].date, "legacy");
    }

    #[test]
    fn countries_counted_and_absent_skipped() {
        let v = aggregate(&sample());
        let mut got: Vec<(String, usize)> = v
            .country_counts
            .into_iter()
            .map(|c| (c.country, c.count))
            .collect();
        got.sort();
        assert_eq!(got, vec![("IN".to_string(), 1), ("US".to_string(), 2)]);
    }

    #[test]
    fn idempotent_and_permutation_invariant_where_expected() {
        let recs = sample();
        let a = aggregate(&recs);
        assert_eq!(a, aggregate(&recs));

        let mut shuffled = recs.clone();
        shuffled.shuffle(&mut rand::rng());
        let b = aggregate(&shuffled);

        assert_eq!(a.sentiment_counts, b.sentiment_counts);
        assert_eq!(a.time_series, b.time_series); // distinct timestamps → same order

        let sorted = |mut v: Vec<CountryCount>| {
            v.sort_by(|x, y| x.country.cmp(&y.country));
            v
        };
        assert_eq!(sorted(a.country_counts), sorted(b.country_counts));

        let domain_set = |v: &[DomainCount]| {
            let mut s: Vec<(String, usize)> = v.iter().map(|d| (d.domain.clone(), d.count)).collect();
            s.sort();
            s
        };
        assert_eq!(domain_set(&a.top_domains), domain_set(&b.top_domains));
    }

    #[test]
    fn serializes_chart_ready_shape() {
        let v = aggregate(&sample());
        let j = serde_json::to_value(&v).unwrap();
        assert_eq!(j["sentimentCounts"]["POSITIVE"], 2);
        assert_eq!(j["topDomains"][0]["domain"], "a.com");
        assert_eq!(j["timeSeries"][0]["score"], -2);
        assert!(j["countryCounts"].is_array());
    }
}
