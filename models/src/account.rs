use serde::Serialize;

/// A bank account visible to the connection's credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankAccount {
    pub name: String,
    pub number: String,
    pub iban: String,
    pub currency: String,
}
