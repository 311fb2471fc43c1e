//! ClinicDesk Sequence Allocation
//!
//! Hands out the next integer in a named, scoped counter without ever
//! producing a duplicate, even when two requests race:
//!
//! - **Tokens**: per (clinic, calendar day), plain positive integers
//! - **Receipt numbers**: per (clinic, calendar year), rendered as
//!   `RCP-{year}-{sequence}` with the sequence zero-padded to 4+ digits
//!
//! No standalone counter document is persisted. The allocator derives the
//! next value from the numbers already allocated (cheap at per-day,
//! per-clinic volumes) and relies on the store's unique indexes to reject
//! the losing side of a race. Callers wrap their uniqueness-enforcing
//! insert in [`retry_unique_insert`], which recomputes and retries a
//! bounded number of times before failing with `SequenceExhausted`.
//!
//! Because the indexes remember deleted rows, "max + 1" is gap-tolerant:
//! deleting the visit holding today's highest token does not cause that
//! token to be issued again.

use std::future::Future;

use chrono::NaiveDate;

use clinicdesk_store::{Store, StoreResult};
use clinicdesk_types::{ClinicId, CoreError};

/// Retry budget for a uniqueness-enforcing insert. Exhausting it signals
/// contention or a bug, not a normal error.
pub const MAX_ALLOCATION_ATTEMPTS: u32 = 5;

/// Derives next token and receipt numbers from the store's indexes
#[derive(Clone)]
pub struct SequenceAllocator {
    store: Store,
}

impl SequenceAllocator {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Next token for (clinic, day): max existing + 1, or 1 if none.
    ///
    /// The returned value is a candidate; it only becomes final once the
    /// caller's unique insert succeeds.
    pub async fn next_token(&self, clinic_id: ClinicId, day: NaiveDate) -> u32 {
        self.store.visit_repo().max_token(clinic_id, day).await + 1
    }

    /// Next receipt number for (clinic, year), formatted `RCP-{year}-{seq}`.
    ///
    /// Existing numbers with non-numeric suffixes are treated as
    /// non-contributing rather than failing the allocation.
    pub async fn next_receipt_number(&self, clinic_id: ClinicId, year: i32) -> String {
        let prefix = receipt_prefix(year);
        let numbers = self
            .store
            .receipt_repo()
            .allocated_numbers(clinic_id, &prefix)
            .await;
        let max_seq = numbers
            .iter()
            .filter_map(|number| parse_receipt_seq(number, year))
            .max()
            .unwrap_or(0);
        format_receipt_number(year, max_seq + 1)
    }
}

/// Render a receipt number: sequence zero-padded to at least 4 digits
pub fn format_receipt_number(year: i32, seq: u32) -> String {
    format!("RCP-{year}-{seq:04}")
}

/// Prefix shared by all of a year's receipt numbers
pub fn receipt_prefix(year: i32) -> String {
    format!("RCP-{year}-")
}

/// Extract the sequence from a receipt number for the given year.
/// Returns None for foreign years or unparseable suffixes.
pub fn parse_receipt_seq(number: &str, year: i32) -> Option<u32> {
    let suffix = number.strip_prefix(&receipt_prefix(year))?;
    suffix.parse().ok()
}

/// Run a uniqueness-enforcing insert with the allocation retry discipline.
///
/// The closure must recompute its candidate number on every attempt (the
/// allocator reads a fresh maximum each time). A duplicate-key rejection
/// triggers a retry; any other store error is terminal; exhausting the
/// budget fails with [`CoreError::SequenceExhausted`] and is logged as an
/// operational alert.
pub async fn retry_unique_insert<T, F, Fut>(scope: &str, f: F) -> clinicdesk_types::Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_duplicate() => {
                tracing::warn!(scope, attempt, "allocation raced, retrying with fresh maximum");
            }
            Err(err) => return Err(err.into()),
        }
    }
    tracing::error!(
        scope,
        attempts = MAX_ALLOCATION_ATTEMPTS,
        "sequence allocation exhausted its retry budget"
    );
    Err(CoreError::SequenceExhausted {
        scope: scope.to_string(),
        attempts: MAX_ALLOCATION_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinicdesk_types::{PatientSnapshot, Visit};

    fn patient() -> PatientSnapshot {
        PatientSnapshot {
            name: "Asha Rao".to_string(),
            phone: "555-0100".to_string(),
            age: None,
            gender: None,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 23).unwrap()
    }

    #[test]
    fn test_receipt_number_format() {
        assert_eq!(format_receipt_number(2026, 1), "RCP-2026-0001");
        assert_eq!(format_receipt_number(2026, 42), "RCP-2026-0042");
        // Padding widens past four digits, it never truncates
        assert_eq!(format_receipt_number(2026, 12345), "RCP-2026-12345");
    }

    #[test]
    fn test_parse_tolerates_junk() {
        assert_eq!(parse_receipt_seq("RCP-2026-0007", 2026), Some(7));
        assert_eq!(parse_receipt_seq("RCP-2026-0007a", 2026), None);
        assert_eq!(parse_receipt_seq("RCP-2025-0007", 2026), None);
        assert_eq!(parse_receipt_seq("garbage", 2026), None);
    }

    #[tokio::test]
    async fn test_first_token_is_one() {
        let store = Store::new();
        let allocator = SequenceAllocator::new(store);
        assert_eq!(allocator.next_token(ClinicId::new(), day()).await, 1);
    }

    #[tokio::test]
    async fn test_unparseable_numbers_do_not_poison_allocation() {
        let store = Store::new();
        let clinic_id = ClinicId::new();
        let repo = store.receipt_repo();

        // Simulate a hand-edited row with a junk suffix
        let rogue = test_receipt(clinic_id, "RCP-2026-00xx");
        repo.insert_unique(rogue).await.unwrap();

        let allocator = SequenceAllocator::new(store);
        assert_eq!(
            allocator.next_receipt_number(clinic_id, 2026).await,
            "RCP-2026-0001"
        );
    }

    #[tokio::test]
    async fn test_concurrent_tokens_are_contiguous() {
        let store = Store::new();
        let clinic_id = ClinicId::new();
        let n = 25u32;

        let mut handles = Vec::new();
        for _ in 0..n {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let allocator = SequenceAllocator::new(store.clone());
                let scope = format!("{clinic_id}/{}", day());
                retry_unique_insert(&scope, || async {
                    let token = allocator.next_token(clinic_id, day()).await;
                    let visit = Visit::new(clinic_id, patient(), "fever", day(), token);
                    store.visit_repo().insert_unique(visit).await
                })
                .await
                .unwrap()
            }));
        }

        let mut tokens = Vec::new();
        for handle in handles {
            tokens.push(handle.await.unwrap().token_number);
        }
        tokens.sort_unstable();
        let expected: Vec<u32> = (1..=n).collect();
        assert_eq!(tokens, expected);
    }

    #[tokio::test]
    async fn test_concurrent_receipt_numbers_are_distinct() {
        let store = Store::new();
        let clinic_id = ClinicId::new();
        let n = 20;

        let mut handles = Vec::new();
        for _ in 0..n {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let allocator = SequenceAllocator::new(store.clone());
                retry_unique_insert(&format!("{clinic_id}/2026"), || async {
                    let number = allocator.next_receipt_number(clinic_id, 2026).await;
                    store
                        .receipt_repo()
                        .insert_unique(test_receipt(clinic_id, &number))
                        .await
                })
                .await
                .unwrap()
            }));
        }

        let mut seqs = Vec::new();
        for handle in handles {
            let receipt = handle.await.unwrap();
            seqs.push(parse_receipt_seq(&receipt.receipt_number, 2026).unwrap());
        }
        seqs.sort_unstable();
        seqs.dedup();
        assert_eq!(seqs.len(), n);
    }

    #[tokio::test]
    async fn test_exhaustion_after_budget() {
        let scope = "clinic_test/2026-08-23";
        let result: clinicdesk_types::Result<()> = retry_unique_insert(scope, || async {
            Err(clinicdesk_store::StoreError::duplicate("visit_token", "k"))
        })
        .await;
        match result {
            Err(CoreError::SequenceExhausted { attempts, .. }) => {
                assert_eq!(attempts, MAX_ALLOCATION_ATTEMPTS);
            }
            other => panic!("expected SequenceExhausted, got {other:?}"),
        }
    }

    fn test_receipt(clinic_id: ClinicId, number: &str) -> clinicdesk_types::Receipt {
        use chrono::Utc;
        use clinicdesk_types::{LineItem, Receipt, ReceiptId};
        Receipt {
            id: ReceiptId::new(),
            clinic_id,
            visit_id: None,
            receipt_number: number.to_string(),
            patient: patient(),
            line_items: vec![LineItem {
                description: "consultation".to_string(),
                amount: 500,
            }],
            subtotal: 500,
            discount_amount: 0,
            discount_reason: None,
            total_amount: 500,
            is_paid: false,
            payment_mode: None,
            receipt_date: day(),
            last_shared_at: None,
            created_at: Utc::now(),
        }
    }
}
