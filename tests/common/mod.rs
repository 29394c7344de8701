//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const GENDERS: [&str; 2] = ["Female", "Male"];
pub const CONTRACTS: [&str; 3] = ["Month-to-month", "One year", "Two year"];
pub const PAYMENTS: [&str; 4] = [
    "Bank transfer",
    "Credit card",
    "Electronic check",
    "Mailed check",
];

/// One-hot width of the fixture's categorical columns plus its two numerics
pub const FEATURE_WIDTH: usize = GENDERS.len() + CONTRACTS.len() + PAYMENTS.len() + 2;

fn attributes(i: usize, churn: bool) -> String {
    let tenure = if churn { 1 + i % 6 } else { 12 + i % 50 };
    let charges = 20.0 + ((i * 7) % 80) as f64 + if churn { 25.5 } else { 0.5 };
    format!(
        "{},{},{},{},{:.2}",
        GENDERS[i % 2],
        CONTRACTS[i % 3],
        PAYMENTS[i % 4],
        tenure,
        charges
    )
}

/// Labelled table with `n` rows; every fifth customer churned
pub fn training_csv(n: usize) -> String {
    let mut csv = String::from("customerID,gender,Contract,PaymentMethod,tenure,MonthlyCharges,Churn\n");
    for i in 0..n {
        let churn = i % 5 == 0;
        csv.push_str(&format!(
            "C{:04},{},{}\n",
            i,
            attributes(i, churn),
            if churn { "Yes" } else { "No" }
        ));
    }
    csv
}

/// Labelled table where nobody churned and gender is coded `F`/`M`
pub fn single_class_csv(n: usize) -> String {
    let mut csv = String::from("customerID,gender,Contract,PaymentMethod,tenure,MonthlyCharges,Churn\n");
    for i in 0..n {
        let coded = attributes(i, false).replacen("Female", "F", 1).replacen("Male", "M", 1);
        csv.push_str(&format!("C{:04},{},No\n", i, coded));
    }
    csv
}

/// Unlabelled table with `n` rows, with or without the identifier column
pub fn new_customers_csv(n: usize, with_ids: bool) -> String {
    let mut csv = String::new();
    if with_ids {
        csv.push_str("customerID,");
    }
    csv.push_str("gender,Contract,PaymentMethod,tenure,MonthlyCharges\n");
    for i in 0..n {
        if with_ids {
            csv.push_str(&format!("N{:03},", i));
        }
        csv.push_str(&attributes(i + 3, i % 2 == 0));
        csv.push('\n');
    }
    csv
}

pub fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}
