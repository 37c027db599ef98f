use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::errors::{BillingError, Entity, Result};
use crate::loan::{Installment, Loan};
use crate::money::Money;
use crate::store::{BillingStore, LoanRepository};
use crate::types::{InstallmentId, LoanId, LoanKey};

#[derive(Debug, Default)]
struct Tables {
    /// loan headers, stored without installments
    loans: HashMap<LoanId, Loan>,
    keys: HashMap<LoanKey, LoanId>,
    installments: HashMap<InstallmentId, Installment>,
    /// installment ids per loan in week order
    by_loan: HashMap<LoanId, Vec<InstallmentId>>,
}

impl Tables {
    fn loan(&self, id: LoanId, include_installments: bool) -> Result<Loan> {
        let header = self.loans.get(&id).ok_or(BillingError::NotFound {
            entity: Entity::Loan(id),
        })?;

        let mut loan = header.clone();
        if include_installments {
            loan.installments = self
                .by_loan
                .get(&id)
                .map(|ids| {
                    ids.iter()
                        .filter_map(|installment_id| self.installments.get(installment_id))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
        }
        Ok(loan)
    }
}

impl LoanRepository for Tables {
    fn create_loan(&mut self, loan: &Loan) -> Result<LoanId> {
        loan.check_installments()?;
        if self.keys.contains_key(&loan.key) {
            return Err(BillingError::Conflict { key: loan.key });
        }
        if self.loans.contains_key(&loan.id) {
            return Err(BillingError::storage(format!("duplicate loan id {}", loan.id)));
        }

        let ids = loan.installments.iter().map(|i| i.id).collect();
        for installment in &loan.installments {
            self.installments.insert(installment.id, installment.clone());
        }
        self.by_loan.insert(loan.id, ids);
        self.keys.insert(loan.key, loan.id);
        self.loans.insert(loan.id, loan.without_installments());

        Ok(loan.id)
    }

    fn find_loan_by_id(&self, id: LoanId, include_installments: bool) -> Result<Loan> {
        self.loan(id, include_installments)
    }

    fn find_loan_by_key(&self, key: LoanKey, include_installments: bool) -> Result<Loan> {
        let id = self.keys.get(&key).ok_or(BillingError::NotFound {
            entity: Entity::LoanByKey(key),
        })?;
        self.loan(*id, include_installments)
    }

    fn find_installment(&self, loan_id: LoanId, week: u32) -> Result<Installment> {
        self.by_loan
            .get(&loan_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.installments.get(id))
            .find(|i| i.week == week)
            .cloned()
            .ok_or(BillingError::NotFound {
                entity: Entity::Installment { loan_id, week },
            })
    }

    fn update_outstanding(&mut self, loan_id: LoanId, balance: Money) -> Result<()> {
        let loan = self.loans.get_mut(&loan_id).ok_or(BillingError::NotFound {
            entity: Entity::Loan(loan_id),
        })?;
        loan.outstanding = balance;
        Ok(())
    }

    fn mark_installment_paid(
        &mut self,
        installment_id: InstallmentId,
        paid_at: DateTime<Utc>,
    ) -> Result<Installment> {
        let installment = self
            .installments
            .get_mut(&installment_id)
            .ok_or(BillingError::NotFound {
                entity: Entity::InstallmentById(installment_id),
            })?;

        if installment.paid {
            return Err(BillingError::AlreadyPaid {
                week: installment.week,
            });
        }
        installment.settle(paid_at);
        Ok(installment.clone())
    }
}

/// write recorded by a transaction, holding what it replaced
#[derive(Debug)]
enum Undo {
    CreatedLoan(LoanId),
    Outstanding { loan_id: LoanId, balance: Money },
    Installment(Installment),
}

impl Tables {
    fn revert(&mut self, undo: Undo) {
        match undo {
            Undo::CreatedLoan(id) => {
                if let Some(loan) = self.loans.remove(&id) {
                    self.keys.remove(&loan.key);
                }
                for installment_id in self.by_loan.remove(&id).unwrap_or_default() {
                    self.installments.remove(&installment_id);
                }
            }
            Undo::Outstanding { loan_id, balance } => {
                if let Some(loan) = self.loans.get_mut(&loan_id) {
                    loan.outstanding = balance;
                }
            }
            Undo::Installment(installment) => {
                self.installments.insert(installment.id, installment);
            }
        }
    }
}

/// transaction-scoped handle: writes go straight to the tables and are
/// journaled so a failed transaction can undo them in reverse order
struct Journal<'a> {
    tables: &'a mut Tables,
    undo: Vec<Undo>,
}

impl Journal<'_> {
    fn rollback(self) {
        for undo in self.undo.into_iter().rev() {
            self.tables.revert(undo);
        }
    }
}

impl LoanRepository for Journal<'_> {
    fn create_loan(&mut self, loan: &Loan) -> Result<LoanId> {
        let id = self.tables.create_loan(loan)?;
        self.undo.push(Undo::CreatedLoan(id));
        Ok(id)
    }

    fn find_loan_by_id(&self, id: LoanId, include_installments: bool) -> Result<Loan> {
        self.tables.find_loan_by_id(id, include_installments)
    }

    fn find_loan_by_key(&self, key: LoanKey, include_installments: bool) -> Result<Loan> {
        self.tables.find_loan_by_key(key, include_installments)
    }

    fn find_installment(&self, loan_id: LoanId, week: u32) -> Result<Installment> {
        self.tables.find_installment(loan_id, week)
    }

    fn update_outstanding(&mut self, loan_id: LoanId, balance: Money) -> Result<()> {
        let previous = self.tables.loans.get(&loan_id).map(|loan| loan.outstanding);
        self.tables.update_outstanding(loan_id, balance)?;
        if let Some(balance) = previous {
            self.undo.push(Undo::Outstanding { loan_id, balance });
        }
        Ok(())
    }

    fn mark_installment_paid(
        &mut self,
        installment_id: InstallmentId,
        paid_at: DateTime<Utc>,
    ) -> Result<Installment> {
        let previous = self.tables.installments.get(&installment_id).cloned();
        let installment = self.tables.mark_installment_paid(installment_id, paid_at)?;
        if let Some(previous) = previous {
            self.undo.push(Undo::Installment(previous));
        }
        Ok(installment)
    }
}

/// in-process store.
///
/// Transactions are serialized behind one lock. Each write is journaled and a
/// failed transaction reverts only the rows it touched.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| BillingError::storage("memory store lock poisoned"))
    }

    pub fn loan_count(&self) -> Result<usize> {
        Ok(self.lock()?.loans.len())
    }
}

impl BillingStore for MemoryStore {
    fn with_default<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn LoanRepository) -> Result<T>,
    {
        let mut tables = self.lock()?;
        work(&mut *tables)
    }

    fn run_transaction<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn LoanRepository) -> Result<T>,
    {
        let mut tables = self.lock()?;
        let mut journal = Journal {
            tables: &mut *tables,
            undo: Vec::new(),
        };

        match work(&mut journal) {
            Ok(output) => Ok(output),
            Err(err) => {
                tracing::debug!(
                    writes = journal.undo.len(),
                    error = %err,
                    "transaction rolled back"
                );
                journal.rollback();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Rate;
    use crate::schedule::create_schedule;
    use crate::types::LoanTerms;
    use chrono::TimeZone;
    use hourglass_rs::{SafeTimeProvider, TimeSource};

    fn new_loan(customer_id: u64, loan_id: u64) -> Loan {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 8, 4, 10, 0, 0).unwrap(),
        ));
        let schedule = create_schedule(LoanTerms::new(
            Money::from_minor(1_000),
            Rate::from_percentage(10),
            4,
        ))
        .unwrap();
        Loan::originate(LoanKey::new(customer_id, loan_id), &schedule, &time).unwrap()
    }

    #[test]
    fn test_create_and_find() {
        let store = MemoryStore::new();
        let loan = new_loan(1, 100);

        let id = store.run_transaction(|repo| repo.create_loan(&loan)).unwrap();
        assert_eq!(id, loan.id);

        let found = store
            .with_default(|repo| repo.find_loan_by_id(id, true))
            .unwrap();
        assert_eq!(found, loan);

        let header = store
            .with_default(|repo| repo.find_loan_by_key(loan.key, false))
            .unwrap();
        assert!(header.installments.is_empty());
        assert_eq!(header.outstanding, loan.outstanding);

        let week = store
            .with_default(|repo| repo.find_installment(id, 3))
            .unwrap();
        assert_eq!(week.week, 3);
    }

    #[test]
    fn test_duplicate_key_conflicts() {
        let store = MemoryStore::new();
        let first = new_loan(1, 100);
        let second = new_loan(1, 100);

        store.run_transaction(|repo| repo.create_loan(&first)).unwrap();
        let err = store
            .run_transaction(|repo| repo.create_loan(&second))
            .unwrap_err();

        assert_eq!(err, BillingError::Conflict { key: LoanKey::new(1, 100) });
        assert_eq!(store.loan_count().unwrap(), 1);
    }

    #[test]
    fn test_lookups_report_not_found() {
        let store = MemoryStore::new();
        let loan = new_loan(1, 100);
        store.run_transaction(|repo| repo.create_loan(&loan)).unwrap();

        let missing = uuid::Uuid::new_v4();
        assert!(matches!(
            store.with_default(|repo| repo.find_loan_by_id(missing, true)),
            Err(BillingError::NotFound { entity: Entity::Loan(_) })
        ));
        assert!(matches!(
            store.with_default(|repo| repo.find_loan_by_key(LoanKey::new(2, 100), true)),
            Err(BillingError::NotFound { entity: Entity::LoanByKey(_) })
        ));
        assert!(matches!(
            store.with_default(|repo| repo.find_installment(loan.id, 9)),
            Err(BillingError::NotFound { entity: Entity::Installment { week: 9, .. } })
        ));
    }

    #[test]
    fn test_failed_transaction_rolls_back_every_write() {
        let store = MemoryStore::new();
        let loan = new_loan(1, 100);
        store.run_transaction(|repo| repo.create_loan(&loan)).unwrap();
        let first_week = loan.installments[0].id;
        let now = loan.created_at;

        let result: Result<()> = store.run_transaction(|repo| {
            repo.mark_installment_paid(first_week, now)?;
            repo.update_outstanding(loan.id, Money::from_minor(825))?;
            Err(BillingError::storage("connection reset"))
        });
        assert!(result.is_err());

        let after = store
            .with_default(|repo| repo.find_loan_by_id(loan.id, true))
            .unwrap();
        assert_eq!(after.outstanding, Money::from_minor(1_100));
        assert!(!after.installments[0].paid);
    }

    #[test]
    fn test_failed_transaction_removes_created_loan() {
        let store = MemoryStore::new();
        let kept = new_loan(1, 100);
        store.run_transaction(|repo| repo.create_loan(&kept)).unwrap();
        let loan = new_loan(2, 200);

        let result: Result<()> = store.run_transaction(|repo| {
            repo.create_loan(&loan)?;
            repo.update_outstanding(kept.id, Money::ZERO)?;
            Err(BillingError::storage("connection reset"))
        });
        assert!(result.is_err());

        assert_eq!(store.loan_count().unwrap(), 1);
        assert!(store
            .with_default(|repo| repo.find_loan_by_key(loan.key, true))
            .is_err());
        assert!(store
            .with_default(|repo| repo.find_installment(loan.id, 1))
            .is_err());
        assert_eq!(
            store
                .with_default(|repo| repo.find_loan_by_id(kept.id, false))
                .unwrap()
                .outstanding,
            Money::from_minor(1_100)
        );

        // the key is free again
        store.run_transaction(|repo| repo.create_loan(&loan)).unwrap();
    }

    #[test]
    fn test_incomplete_installment_sequence_is_rejected() {
        let store = MemoryStore::new();

        let mut gapped = new_loan(1, 100);
        gapped.installments.remove(1);
        let err = store
            .run_transaction(|repo| repo.create_loan(&gapped))
            .unwrap_err();
        assert!(matches!(err, BillingError::Validation { field: "installments", .. }));

        let mut foreign = new_loan(1, 101);
        foreign.installments[0].loan_id = uuid::Uuid::new_v4();
        let err = store
            .run_transaction(|repo| repo.create_loan(&foreign))
            .unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Validation);

        assert_eq!(store.loan_count().unwrap(), 0);
    }

    #[test]
    fn test_mark_paid_twice_is_rejected() {
        let store = MemoryStore::new();
        let loan = new_loan(1, 100);
        store.run_transaction(|repo| repo.create_loan(&loan)).unwrap();
        let id = loan.installments[1].id;

        let paid = store
            .run_transaction(|repo| repo.mark_installment_paid(id, loan.created_at))
            .unwrap();
        assert!(paid.paid);
        assert_eq!(paid.paid_at, Some(loan.created_at));

        let err = store
            .run_transaction(|repo| repo.mark_installment_paid(id, loan.created_at))
            .unwrap_err();
        assert_eq!(err, BillingError::AlreadyPaid { week: 2 });
    }
}
