//! String values: date-like field names, formats, patterns, then bounded words.

use chrono::{Duration, NaiveDate, NaiveTime};
use datagen_core::{StringFormat, StringSpec};
use rand::{Rng, RngCore};
use serde_json::Value;

use crate::errors::GenerationError;
use crate::generators::pattern::generate_pattern;
use crate::generators::{SampleContext, Sampler};
use crate::model::GenerationIssue;

/// Field-name fragments that turn a string column into a date column.
const DATE_KEYWORDS: [&str; 8] = [
    "date", "created", "updated", "birth", "expired", "start", "end", "time",
];
const WINDOW_DAYS: i64 = 5 * 365;
const DEFAULT_MIN_LENGTH: usize = 3;
const DEFAULT_MAX_LENGTH: usize = 12;
const UNIQUE_ATTEMPTS: usize = 32;
const PAD_ROUNDS: usize = 16;

pub fn generate_string(
    sampler: &Sampler,
    spec: &StringSpec,
    unique: bool,
    field: Option<&str>,
    ctx: &mut SampleContext<'_>,
) -> Result<Value, GenerationError> {
    let (min_len, max_len) = length_bounds(spec);

    if is_date_field(field) {
        ctx.record_usage("string.date_field");
        return Ok(match date_in_window(sampler.base_date(), ctx.rng) {
            Some(date) => Value::String(date.format("%Y-%m-%d").to_string()),
            None => fallback(sampler, max_len, field, ctx),
        });
    }

    let text = match &spec.format {
        Some(StringFormat::Email) => {
            ctx.record_usage("string.email");
            Some(email(sampler, unique, ctx))
        }
        Some(StringFormat::Uuid) => {
            ctx.record_usage("string.uuid");
            Some(uuid_value(unique, ctx))
        }
        Some(StringFormat::Date) => {
            ctx.record_usage("string.date");
            date_in_window(sampler.base_date(), ctx.rng)
                .map(|date| date.format("%Y-%m-%d").to_string())
        }
        Some(StringFormat::DateTime) => {
            ctx.record_usage("string.datetime");
            datetime_in_window(sampler.base_date(), ctx.rng)
        }
        Some(StringFormat::Name) => {
            ctx.record_usage("string.name");
            Some(sampler.faker().name(ctx.rng))
        }
        Some(StringFormat::Uri) => {
            ctx.record_usage("string.uri");
            Some(uri(sampler, ctx.rng))
        }
        Some(StringFormat::Other(_)) | None => match &spec.pattern {
            Some(pattern) => {
                ctx.record_usage("string.pattern");
                pattern_value(sampler, pattern, field, ctx)?
            }
            None => {
                ctx.record_usage("string.word");
                Some(bounded_word(sampler, min_len, max_len, ctx.rng))
            }
        },
    };

    Ok(match text {
        Some(text) => Value::String(text),
        None => fallback(sampler, max_len, field, ctx),
    })
}

/// `(minLength, maxLength)` with defaults 3/12. A lone `minLength` above the
/// default keeps the default width; a lone `maxLength` below it pins both.
fn length_bounds(spec: &StringSpec) -> (usize, usize) {
    match (spec.min_length, spec.max_length) {
        (Some(min), Some(max)) => (min, max.max(min)),
        (Some(min), None) if min > DEFAULT_MAX_LENGTH => {
            (min, min + (DEFAULT_MAX_LENGTH - DEFAULT_MIN_LENGTH))
        }
        (Some(min), None) => (min, DEFAULT_MAX_LENGTH),
        (None, Some(max)) => (DEFAULT_MIN_LENGTH.min(max), max),
        (None, None) => (DEFAULT_MIN_LENGTH, DEFAULT_MAX_LENGTH),
    }
}

fn is_date_field(field: Option<&str>) -> bool {
    let Some(field) = field else {
        return false;
    };
    let field = field.to_lowercase();
    DATE_KEYWORDS.iter().any(|keyword| field.contains(keyword))
}

fn date_in_window(base: NaiveDate, rng: &mut dyn RngCore) -> Option<NaiveDate> {
    let offset = rng.random_range(-WINDOW_DAYS..=WINDOW_DAYS);
    base.checked_add_signed(Duration::days(offset))
}

fn datetime_in_window(base: NaiveDate, rng: &mut dyn RngCore) -> Option<String> {
    let window = WINDOW_DAYS * 86_400;
    let offset = rng.random_range(-window..=window);
    let start = base.and_time(NaiveTime::MIN);
    start
        .checked_add_signed(Duration::seconds(offset))
        .map(|value| value.format("%Y-%m-%dT%H:%M:%S").to_string())
}

fn email(sampler: &Sampler, unique: bool, ctx: &mut SampleContext<'_>) -> String {
    if !unique {
        return sampler.faker().safe_email(ctx.rng);
    }
    let mut candidate = sampler.faker().safe_email(ctx.rng);
    for _ in 1..UNIQUE_ATTEMPTS {
        if ctx.session.claim_unique("email", &candidate) {
            return candidate;
        }
        candidate = sampler.faker().safe_email(ctx.rng);
    }
    let (local, domain) = candidate
        .split_once('@')
        .map(|(local, domain)| (local.to_string(), domain.to_string()))
        .unwrap_or_else(|| (candidate.clone(), "example.com".to_string()));
    suffixed(ctx, "email", |n| format!("{local}{n}@{domain}"))
}

fn uuid_value(unique: bool, ctx: &mut SampleContext<'_>) -> String {
    if !unique {
        return random_uuid(ctx.rng);
    }
    for _ in 0..UNIQUE_ATTEMPTS {
        let candidate = random_uuid(ctx.rng);
        if ctx.session.claim_unique("uuid", &candidate) {
            return candidate;
        }
    }
    let base = random_uuid(ctx.rng);
    suffixed(ctx, "uuid", |n| format!("{base}-{n}"))
}

fn random_uuid(rng: &mut dyn RngCore) -> String {
    let mut bytes = [0_u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

/// Counter-suffixed candidates until one is unclaimed.
fn suffixed(
    ctx: &mut SampleContext<'_>,
    kind: &'static str,
    render: impl Fn(u64) -> String,
) -> String {
    let mut n = 1_u64;
    loop {
        let candidate = render(n);
        if ctx.session.claim_unique(kind, &candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn uri(sampler: &Sampler, rng: &mut dyn RngCore) -> String {
    let host: String = sampler
        .faker()
        .word(rng)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase();
    let host = if host.is_empty() { "example".to_string() } else { host };
    let suffix = sampler.faker().domain_suffix(rng);
    format!("https://www.{host}.{suffix}/")
}

fn pattern_value(
    sampler: &Sampler,
    pattern: &str,
    field: Option<&str>,
    ctx: &mut SampleContext<'_>,
) -> Result<Option<String>, GenerationError> {
    let Some(output) = generate_pattern(pattern, ctx.rng) else {
        return Ok(None);
    };
    if output.passthrough {
        if sampler.strict_patterns() {
            return Err(GenerationError::UnsupportedPattern {
                pattern: pattern.to_string(),
            });
        }
        ctx.session.warn_once(
            GenerationIssue::warning(
                "pattern_passthrough",
                format!("pattern '{pattern}' contains unsupported syntax, copied literally"),
            )
            .at(ctx.table, field.unwrap_or("")),
        );
    }
    Ok(Some(output.value))
}

/// Random word cut to `max_len`, or extended with fragments of other words
/// up to `min_len`.
fn bounded_word(sampler: &Sampler, min_len: usize, max_len: usize, rng: &mut dyn RngCore) -> String {
    let mut word = sampler.faker().word(rng);
    let mut rounds = 0;
    while word.chars().count() < min_len && rounds < PAD_ROUNDS {
        let missing = min_len - word.chars().count();
        word.extend(sampler.faker().word(rng).chars().take(missing));
        rounds += 1;
    }
    while word.chars().count() < min_len {
        word.push('x');
    }
    word.chars().take(max_len).collect()
}

fn fallback(
    sampler: &Sampler,
    max_len: usize,
    field: Option<&str>,
    ctx: &mut SampleContext<'_>,
) -> Value {
    ctx.record_fallback(field, "string generation failed, used a random word".to_string());
    Value::String(sampler.faker().word(ctx.rng).chars().take(max_len).collect())
}
