//! Account query descriptor and result set

use serde::Serialize;

use super::entity::{Account, AccountId, AccountStatus, AccountType};

/// Optional-field account query
///
/// A filter with no discriminating field does not match anything unless it
/// was built with [`AccountFilter::all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountFilter {
    pub id: Option<AccountId>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub status: Option<AccountStatus>,
    pub account_type: Option<AccountType>,
    pub role: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
    match_all: bool,
}

impl AccountFilter {
    /// Explicitly match every account
    pub fn all() -> Self {
        Self {
            match_all: true,
            ..Default::default()
        }
    }

    pub fn by_id(id: AccountId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn by_username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Default::default()
        }
    }

    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = Some(account_type);
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn is_match_all(&self) -> bool {
        self.match_all
    }

    /// True when no field narrows the query and `all()` was not requested
    pub fn is_unconstrained(&self) -> bool {
        !self.match_all
            && self.id.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.status.is_none()
            && self.account_type.is_none()
            && self.role.is_none()
    }

    /// Check whether an account satisfies every set field
    pub fn matches(&self, account: &Account) -> bool {
        if self.is_unconstrained() {
            return false;
        }

        self.id.is_none_or(|id| *account.id() == id)
            && self
                .username
                .as_deref()
                .is_none_or(|u| account.username() == u)
            && self.email.as_deref().is_none_or(|e| account.email() == e)
            && self.status.is_none_or(|s| account.status() == s)
            && self
                .account_type
                .is_none_or(|t| account.account_type() == t)
            && self.role.as_deref().is_none_or(|r| account.role() == r)
    }
}

/// Ordered page of accounts plus the total number of matches
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountResultSet {
    pub accounts: Vec<Account>,
    pub total: usize,
}

/// How many accounts a uniqueness-guaranteed query resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum AccountMatch {
    None,
    One(Account),
    Many(usize),
}

impl AccountResultSet {
    pub fn new(accounts: Vec<Account>, total: usize) -> Self {
        Self { accounts, total }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Classify the result as zero, exactly one or ambiguous
    pub fn into_match(self) -> AccountMatch {
        match self.total {
            0 => AccountMatch::None,
            1 => self
                .accounts
                .into_iter()
                .next()
                .map_or(AccountMatch::None, AccountMatch::One),
            n => AccountMatch::Many(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(username: &str, email: &str) -> Account {
        Account::new(username, email).with_id(AccountId::generate())
    }

    #[test]
    fn test_empty_filter_matches_nothing() {
        let filter = AccountFilter::default();

        assert!(filter.is_unconstrained());
        assert!(!filter.matches(&account("john.doe1", "john@example.com")));
    }

    #[test]
    fn test_all_filter_matches_everything() {
        let filter = AccountFilter::all();

        assert!(!filter.is_unconstrained());
        assert!(filter.matches(&account("john.doe1", "john@example.com")));
    }

    #[test]
    fn test_paging_alone_does_not_constrain() {
        let filter = AccountFilter::default().with_limit(10).with_offset(5);
        assert!(filter.is_unconstrained());
    }

    #[test]
    fn test_matches_on_each_field() {
        let a = account("john.doe1", "john@example.com")
            .with_role("admin")
            .with_status(AccountStatus::Active)
            .with_account_type(AccountType::Admin);

        assert!(AccountFilter::by_id(*a.id()).matches(&a));
        assert!(AccountFilter::by_username("john.doe1").matches(&a));
        assert!(AccountFilter::by_email("john@example.com").matches(&a));
        assert!(AccountFilter::all().with_role("admin").matches(&a));
        assert!(AccountFilter::all()
            .with_status(AccountStatus::Active)
            .with_account_type(AccountType::Admin)
            .matches(&a));

        assert!(!AccountFilter::by_username("jane.doe1").matches(&a));
        assert!(!AccountFilter::by_email("john@example.com")
            .with_status(AccountStatus::Suspended)
            .matches(&a));
    }

    #[test]
    fn test_into_match() {
        assert_eq!(AccountResultSet::empty().into_match(), AccountMatch::None);

        let a = account("john.doe1", "john@example.com");
        assert_eq!(
            AccountResultSet::new(vec![a.clone()], 1).into_match(),
            AccountMatch::One(a.clone())
        );

        let b = account("jane.doe1", "jane@example.com");
        assert_eq!(
            AccountResultSet::new(vec![a, b], 2).into_match(),
            AccountMatch::Many(2)
        );
    }
}
