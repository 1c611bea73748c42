//! Deterministic snapshot generation from seed definitions.
//!
//! The same seed always produces identical collections. Documents vary the
//! way long-lived upstream data does, so the output doubles as a fixture for
//! the backend normalizer.

use fake::Fake;
use fake::faker::name::raw::{FirstName, LastName};
use fake::locales::EN;
use rand::distr::Alphanumeric;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{Map, Value, json};

use crate::error::GenerationError;
use crate::money::format_currency;
use crate::registry::{SeedDefinition, SeedRegistry};
use crate::seed::DemoSnapshot;

/// Length of generated uids, matching the identity provider's format.
const UID_LEN: usize = 28;

/// Upstream spellings of the display name key.
const NAME_KEYS: [&str; 3] = ["fullName", "username", "name"];

const EMAIL_DOMAINS: [&str; 3] = ["example.com", "mail.test", "broker.io"];

const KINDS: [&str; 4] = ["deposit", "withdrawal", "profit", "investment"];

const STATUSES: [&str; 3] = ["pending", "completed", "failed"];

const CHANNELS: [&str; 3] = ["wire", "card", "crypto"];

/// 2026-01-01T00:00:00Z in epoch milliseconds.
const EPOCH_MS: i64 = 1_767_225_600_000;

const DAY_MS: i64 = 86_400_000;

const HISTORY_DAYS: i64 = 365;

/// Owner of transactions whose user was deleted upstream.
const ORPHAN_UID: &str = "deleted-account";

/// Generates a demo snapshot from a seed definition.
///
/// Users get a random uid, a faked name under one of several keys, a
/// balance that is either a number or currency text and a profit under
/// `profit` or `totalProfit`. The transaction array always starts with a
/// `null` slot and may contain more; a few transactions belong to a user that
/// no longer exists.
///
/// # Errors
///
/// Returns [`GenerationError`] if the registry has no countries, or the
/// seed asks for transactions but no users.
///
/// # Example
///
/// ```
/// use demo_data::{SeedRegistry, generate_demo_snapshot};
///
/// let json = r#"{
///     "version": 1,
///     "countries": ["Chile"],
///     "seeds": [{"name": "test", "seed": 42, "userCount": 3, "transactionCount": 5}]
/// }"#;
///
/// let registry = SeedRegistry::from_json(json).expect("valid");
/// let seed_def = registry.find_seed("test").expect("found");
/// let first = generate_demo_snapshot(&registry, seed_def).expect("generated");
/// let second = generate_demo_snapshot(&registry, seed_def).expect("generated");
///
/// assert_eq!(first, second);
/// assert_eq!(first.transaction_count(), 5);
/// ```
pub fn generate_demo_snapshot(
    registry: &SeedRegistry,
    seed_def: &SeedDefinition,
) -> Result<DemoSnapshot, GenerationError> {
    if registry.countries().is_empty() {
        return Err(GenerationError::NoCountries);
    }
    if seed_def.user_count() == 0 && seed_def.transaction_count() > 0 {
        return Err(GenerationError::TransactionsWithoutUsers {
            transactions: seed_def.transaction_count(),
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed_def.seed());
    let mut users = Map::new();
    let mut uids = Vec::with_capacity(seed_def.user_count());
    for _ in 0..seed_def.user_count() {
        let (uid, document) = generate_user(&mut rng, registry.countries());
        uids.push(uid.clone());
        users.insert(uid, Value::Object(document));
    }

    let mut transactions = Vec::with_capacity(seed_def.transaction_count() + 1);
    transactions.push(Value::Null);
    for _ in 0..seed_def.transaction_count() {
        if rng.random_ratio(1, 10) {
            transactions.push(Value::Null);
        }
        transactions.push(Value::Object(generate_transaction(&mut rng, &uids)));
    }

    Ok(DemoSnapshot {
        users,
        transactions,
    })
}

fn generate_user(rng: &mut ChaCha8Rng, countries: &[String]) -> (String, Map<String, Value>) {
    let uid: String = (0..UID_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect();
    let first: String = FirstName(EN).fake_with_rng(rng);
    let last: String = LastName(EN).fake_with_rng(rng);

    let mut document = Map::new();
    document.insert(
        pick(rng, &NAME_KEYS).to_owned(),
        json!(format!("{first} {last}")),
    );
    document.insert(
        "email".to_owned(),
        json!(format!(
            "{}.{}@{}",
            email_part(&first),
            email_part(&last),
            pick(rng, &EMAIL_DOMAINS)
        )),
    );
    document.insert(
        "country".to_owned(),
        json!(countries.choose(rng).cloned().unwrap_or_default()),
    );

    let balance_key = if rng.random_ratio(1, 5) {
        "accountBalance"
    } else {
        "balance"
    };
    let balance = rng.random_range(0..5_000_000_u64);
    document.insert(balance_key.to_owned(), amount(rng, balance));

    let profit_key = if rng.random_ratio(1, 2) {
        "profit"
    } else {
        "totalProfit"
    };
    let profit = rng.random_range(0..200_000_u64);
    document.insert(profit_key.to_owned(), json!(profit.div_euclid(100)));

    let deposit = balance.saturating_add(rng.random_range(0..1_000_000_u64));
    document.insert("totalDeposit".to_owned(), amount(rng, deposit));

    if rng.random_ratio(2, 3) {
        document.insert(
            "phone".to_owned(),
            json!(format!(
                "+{} {}",
                rng.random_range(1..100_u32),
                rng.random_range(1_000_000..10_000_000_u32)
            )),
        );
    }
    document.insert("role".to_owned(), json!("user"));
    document.insert("createdAt".to_owned(), json!(past_instant(rng)));

    (uid, document)
}

fn generate_transaction(rng: &mut ChaCha8Rng, uids: &[String]) -> Map<String, Value> {
    let owner = if rng.random_ratio(1, 12) {
        ORPHAN_UID.to_owned()
    } else {
        uids.choose(rng).cloned().unwrap_or_default()
    };
    let owner_key = if rng.random_ratio(1, 4) { "uid" } else { "userId" };
    let kind = pick(rng, &KINDS);

    let mut document = Map::new();
    document.insert(owner_key.to_owned(), json!(owner));
    document.insert(
        "type".to_owned(),
        json!(if rng.random_ratio(1, 3) {
            capitalize(kind)
        } else {
            kind.to_owned()
        }),
    );
    let cents = rng.random_range(100..2_500_000_u64);
    document.insert("amount".to_owned(), amount(rng, cents));
    let time_key = if rng.random_ratio(1, 5) { "date" } else { "timestamp" };
    document.insert(time_key.to_owned(), json!(past_instant(rng)));
    document.insert("status".to_owned(), json!(pick(rng, &STATUSES)));
    if rng.random_ratio(1, 2) {
        document.insert(
            "description".to_owned(),
            json!(format!("{} via {}", capitalize(kind), pick(rng, &CHANNELS))),
        );
    }
    document
}

/// Currency text or a whole-unit number, chosen at random.
fn amount(rng: &mut ChaCha8Rng, cents: u64) -> Value {
    if rng.random_ratio(1, 2) {
        json!(format_currency(cents))
    } else {
        json!(cents.div_euclid(100))
    }
}

fn past_instant(rng: &mut ChaCha8Rng) -> i64 {
    let days = rng.random_range(0..HISTORY_DAYS);
    let offset = rng.random_range(0..DAY_MS);
    EPOCH_MS - days * DAY_MS - offset
}

fn pick<'a>(rng: &mut ChaCha8Rng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn email_part(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    const TEST_REGISTRY_JSON: &str = r#"{
        "version": 1,
        "countries": ["Chile", "Kenya", "Portugal"],
        "seeds": [
            {"name": "busy-desk", "seed": 42, "userCount": 40, "transactionCount": 60},
            {"name": "small-desk", "seed": 123, "userCount": 2, "transactionCount": 3},
            {"name": "empty-desk", "seed": 9, "userCount": 0, "transactionCount": 2}
        ]
    }"#;

    #[fixture]
    fn registry() -> SeedRegistry {
        SeedRegistry::from_json(TEST_REGISTRY_JSON).expect("valid test registry")
    }

    fn snapshot(registry: &SeedRegistry, name: &str) -> DemoSnapshot {
        let seed_def = registry.find_seed(name).expect("seed found");
        generate_demo_snapshot(registry, seed_def).expect("generated")
    }

    #[rstest]
    fn generates_requested_counts(registry: SeedRegistry) {
        let snapshot = snapshot(&registry, "busy-desk");
        assert_eq!(snapshot.user_count(), 40);
        assert_eq!(snapshot.transaction_count(), 60);
        assert_eq!(snapshot.transactions.first(), Some(&Value::Null));
    }

    #[rstest]
    fn generation_is_deterministic(registry: SeedRegistry) {
        assert_eq!(
            snapshot(&registry, "busy-desk"),
            snapshot(&registry, "busy-desk")
        );
    }

    #[rstest]
    fn different_seeds_produce_different_users(registry: SeedRegistry) {
        let busy = snapshot(&registry, "busy-desk");
        let small = snapshot(&registry, "small-desk");
        assert_ne!(busy.users.keys().next(), small.users.keys().next());
    }

    #[rstest]
    fn users_mix_upstream_spellings(registry: SeedRegistry) {
        let snapshot = snapshot(&registry, "busy-desk");
        let documents: Vec<&Map<String, Value>> = snapshot
            .users
            .values()
            .filter_map(Value::as_object)
            .collect();

        assert!(documents.iter().all(|doc| {
            NAME_KEYS.iter().filter(|key| doc.contains_key(**key)).count() == 1
        }));
        assert!(documents.iter().any(|doc| !doc.contains_key("fullName")));
        assert!(documents.iter().any(|doc| doc.contains_key("profit")));
        assert!(
            documents
                .iter()
                .filter_map(|doc| doc.get("balance").or_else(|| doc.get("accountBalance")))
                .any(|balance| balance.as_str().is_some_and(|text| text.starts_with('$')))
        );
    }

    #[rstest]
    fn users_live_in_registry_countries(registry: SeedRegistry) {
        let snapshot = snapshot(&registry, "busy-desk");
        assert!(snapshot.users.values().all(|doc| {
            doc["country"]
                .as_str()
                .is_some_and(|country| registry.countries().iter().any(|known| known == country))
        }));
    }

    #[rstest]
    fn transactions_reference_generated_or_orphaned_users(registry: SeedRegistry) {
        let snapshot = snapshot(&registry, "busy-desk");
        for transaction in snapshot.transactions.iter().filter(|slot| !slot.is_null()) {
            let owner = transaction
                .get("userId")
                .or_else(|| transaction.get("uid"))
                .and_then(Value::as_str)
                .expect("owner present");
            assert!(owner == ORPHAN_UID || snapshot.users.contains_key(owner));
        }
    }

    #[rstest]
    fn transactions_need_users(registry: SeedRegistry) {
        let seed_def = registry.find_seed("empty-desk").expect("seed found");
        assert_eq!(
            generate_demo_snapshot(&registry, seed_def),
            Err(GenerationError::TransactionsWithoutUsers { transactions: 2 })
        );
    }

    #[test]
    fn registries_need_countries() {
        let registry = SeedRegistry::from_json(
            r#"{"version": 1, "countries": [], "seeds": [{"name": "a", "seed": 1, "userCount": 1}]}"#,
        )
        .expect("valid registry");
        let seed_def = registry.find_seed("a").expect("seed found");
        assert_eq!(
            generate_demo_snapshot(&registry, seed_def),
            Err(GenerationError::NoCountries)
        );
    }

    #[rstest]
    #[case("deposit", "Deposit")]
    #[case("", "")]
    fn capitalizes_first_letter(#[case] word: &str, #[case] expected: &str) {
        assert_eq!(capitalize(word), expected);
    }

    #[test]
    fn email_parts_drop_punctuation() {
        assert_eq!(email_part("O'Conner"), "oconner");
    }
}
