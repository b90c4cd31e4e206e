//! Supplier submissions: validation, snapshot and append-only storage.
//!
//! A submission freezes the calculation results at the moment the supplier
//! confirms the form. Stored records are never recomputed.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::calculator::{CalculationInput, CalculationReport, CalculatorConfig, calculate};
use crate::model::{ValidationError, find_container};

/// Rejection of a submission at the form boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    #[error("Supplier name is required")]
    MissingSupplierName,
    #[error("Primary weight must be greater than 0")]
    NonPositiveWeight,
    #[error("Unknown container type '{0}'")]
    UnknownContainer(String),
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),
}

/// Form data for one submission, as entered.
#[derive(Clone, Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "supplier_name": "Acme Plastics",
    "supplier_code": "ACM-01",
    "contact": "Jordan Lee",
    "email": "jordan@acme.example",
    "phone": "+1 555 0100",
    "part_name": "Bracket",
    "part_number": "BR-2231",
    "part_group": "Chassis",
    "selected_container": "40' Standard",
    "packaging": {
        "unit_system": "metric",
        "primary_dims": { "length": 40.0, "width": 30.0, "height": 20.0 },
        "primary_weight": 5.0,
        "quantity_per_primary": 10,
        "material": "Plastic",
        "pallet_dims": { "length": 120.0, "width": 100.0, "height": 150.0 },
        "indicators": ["Recyclable", "Reusable"]
    }
}))]
pub struct SubmissionDraft {
    pub supplier_name: String,
    #[serde(default)]
    pub supplier_code: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub part_name: String,
    #[serde(default)]
    pub part_number: String,
    #[serde(default)]
    pub part_group: String,
    pub selected_container: String,
    pub packaging: CalculationInput,
}

impl SubmissionDraft {
    /// Checks the required fields before anything is calculated.
    pub fn validate(&self) -> Result<(), SubmissionError> {
        if self.supplier_name.trim().is_empty() {
            return Err(SubmissionError::MissingSupplierName);
        }
        if !(self.packaging.primary_weight > 0.0) {
            return Err(SubmissionError::NonPositiveWeight);
        }
        self.packaging.validate()?;
        if find_container(&self.selected_container).is_none() {
            return Err(SubmissionError::UnknownContainer(
                self.selected_container.trim().to_string(),
            ));
        }
        Ok(())
    }

    /// Validates, calculates and snapshots the draft.
    pub fn into_submission(self, config: &CalculatorConfig) -> Result<Submission, SubmissionError> {
        self.validate()?;
        let report = calculate(&self.packaging, config);
        Ok(Submission::snapshot(self, &report))
    }
}

/// Frozen submission record.
///
/// Field order is the export column order.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct Submission {
    #[serde(rename = "Supplier Name")]
    pub supplier_name: String,
    #[serde(rename = "Supplier Code")]
    pub supplier_code: String,
    #[serde(rename = "Contact")]
    pub contact: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Part Name")]
    pub part_name: String,
    #[serde(rename = "Part Number")]
    pub part_number: String,
    #[serde(rename = "Part Group")]
    pub part_group: String,
    #[serde(rename = "Material")]
    pub material: String,
    #[serde(rename = "Dimensions")]
    pub dimensions: String,
    #[serde(rename = "Weight")]
    pub weight: String,
    #[serde(rename = "Quantity per Primary")]
    pub quantity_per_primary: u32,
    #[serde(rename = "Quantity per Secondary")]
    pub quantity_per_secondary: u64,
    /// In the submission's own mass unit.
    #[serde(rename = "Secondary Weight")]
    pub secondary_weight: f64,
    #[serde(rename = "Selected Container")]
    pub selected_container: String,
    #[serde(rename = "Pallets per Container")]
    pub pallets_per_container: u64,
    #[serde(rename = "Utilization")]
    pub utilization: f64,
    #[serde(rename = "Sustainability Score")]
    pub sustainability_score: u32,
    #[serde(rename = "Estimated Cost")]
    pub estimated_cost: f64,
}

impl Submission {
    fn snapshot(draft: SubmissionDraft, report: &CalculationReport) -> Self {
        let unit_system = report.unit_system;
        let packaging = &draft.packaging;
        let dims = packaging.primary_dims;
        let container = draft.selected_container.trim().to_string();
        let fit = report.rollup.fit_for(&container);

        Self {
            supplier_name: draft.supplier_name.trim().to_string(),
            supplier_code: draft.supplier_code,
            contact: draft.contact,
            email: draft.email,
            phone: draft.phone,
            part_name: draft.part_name,
            part_number: draft.part_number,
            part_group: draft.part_group,
            material: packaging.material.to_string(),
            dimensions: format!(
                "{}x{}x{} ({})",
                dims.length,
                dims.width,
                dims.height,
                unit_system.length_unit()
            ),
            weight: format!("{} ({})", packaging.primary_weight, unit_system.mass_unit()),
            quantity_per_primary: packaging.quantity_per_primary,
            quantity_per_secondary: report.packing.quantity_per_secondary,
            secondary_weight: report.secondary_weight,
            pallets_per_container: fit.map_or(0, |fit| fit.pallets_per_container),
            utilization: fit.map_or(0.0, |fit| fit.utilization_percent),
            selected_container: container,
            sustainability_score: report.sustainability_score,
            estimated_cost: report.estimated_cost,
        }
    }
}

/// Append-only collection of submissions.
///
/// Implementations must serialize concurrent appends and keep insertion
/// order.
pub trait SubmissionStore: Send + Sync {
    /// Appends a record and returns its 1-based position.
    fn append(&self, submission: Submission) -> usize;

    /// All records in insertion order.
    fn list(&self) -> Vec<Submission>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySubmissionStore {
    records: Mutex<Vec<Submission>>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SubmissionStore for InMemorySubmissionStore {
    fn append(&self, submission: Submission) -> usize {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.push(submission);
        records.len()
    }

    fn list(&self) -> Vec<Submission> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Dashboard figures over all submissions.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct SubmissionSummary {
    pub total_submissions: usize,
    pub unique_suppliers: usize,
    pub average_secondary_weight: f64,
}

impl SubmissionSummary {
    pub fn from_submissions(submissions: &[Submission]) -> Self {
        let total_submissions = submissions.len();
        let unique_suppliers = submissions
            .iter()
            .map(|s| s.supplier_name.as_str())
            .collect::<HashSet<_>>()
            .len();
        let average_secondary_weight = if total_submissions == 0 {
            0.0
        } else {
            submissions.iter().map(|s| s.secondary_weight).sum::<f64>() / total_submissions as f64
        };

        Self {
            total_submissions,
            unique_suppliers,
            average_secondary_weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Material;
    use crate::sustainability::Indicator;
    use crate::types::Dimensions3D;
    use crate::units::UnitSystem;
    use std::sync::Arc;

    fn draft(supplier: &str) -> SubmissionDraft {
        SubmissionDraft {
            supplier_name: supplier.to_string(),
            supplier_code: "S-1".to_string(),
            contact: "Jordan".to_string(),
            email: "jordan@example.com".to_string(),
            phone: "555".to_string(),
            part_name: "Bracket".to_string(),
            part_number: "BR-1".to_string(),
            part_group: "Chassis".to_string(),
            selected_container: "40' Standard".to_string(),
            packaging: CalculationInput {
                unit_system: Some(UnitSystem::Metric),
                primary_dims: Dimensions3D::new(40.0, 30.0, 20.0),
                primary_weight: 5.0,
                quantity_per_primary: 10,
                material: Material::Plastic,
                pallet_dims: Dimensions3D::new(120.0, 100.0, 150.0),
                indicators: [Indicator::Recyclable].into_iter().collect(),
            },
        }
    }

    #[test]
    fn snapshot_captures_calculated_values() {
        let submission = draft("Acme")
            .into_submission(&CalculatorConfig::default())
            .expect("valid draft");

        assert_eq!(submission.supplier_name, "Acme");
        assert_eq!(submission.material, "Plastic");
        assert_eq!(submission.dimensions, "40x30x20 (cm)");
        assert_eq!(submission.weight, "5 (kg)");
        assert_eq!(submission.quantity_per_primary, 10);
        assert_eq!(submission.quantity_per_secondary, 630);
        assert_eq!(submission.selected_container, "40' Standard");
        assert_eq!(submission.pallets_per_container, 20);
        assert!((submission.utilization - 53.42).abs() < 0.01);
        assert_eq!(submission.sustainability_score, 33);
        assert_eq!(submission.estimated_cost, 4.0);
    }

    #[test]
    fn imperial_submission_labels_units() {
        let mut d = draft("Acme");
        d.packaging.unit_system = Some(UnitSystem::Imperial);
        d.packaging.primary_dims = Dimensions3D::new(10.0, 12.5, 8.0);
        let submission = d.into_submission(&CalculatorConfig::default()).unwrap();
        assert_eq!(submission.dimensions, "10x12.5x8 (in)");
        assert_eq!(submission.weight, "5 (lb)");
    }

    #[test]
    fn blank_supplier_name_is_rejected() {
        let err = draft("   ")
            .into_submission(&CalculatorConfig::default())
            .unwrap_err();
        assert_eq!(err, SubmissionError::MissingSupplierName);
    }

    #[test]
    fn non_positive_weight_is_rejected() {
        let mut d = draft("Acme");
        d.packaging.primary_weight = 0.0;
        assert_eq!(d.validate(), Err(SubmissionError::NonPositiveWeight));
    }

    #[test]
    fn negative_dimension_is_rejected() {
        let mut d = draft("Acme");
        d.packaging.primary_dims = Dimensions3D::new(40.0, -30.0, 20.0);
        assert!(matches!(
            d.validate(),
            Err(SubmissionError::InvalidInput(ValidationError::InvalidDimension(_)))
        ));
    }

    #[test]
    fn unknown_container_is_rejected() {
        let mut d = draft("Acme");
        d.selected_container = "20' Reefer".to_string();
        assert_eq!(
            d.validate(),
            Err(SubmissionError::UnknownContainer("20' Reefer".to_string()))
        );
    }

    #[test]
    fn serialized_columns_keep_form_order() {
        let submission = draft("Acme")
            .into_submission(&CalculatorConfig::default())
            .unwrap();
        let json = serde_json::to_string(&submission).unwrap();
        let columns = [
            "Supplier Name",
            "Supplier Code",
            "Contact",
            "Email",
            "Phone",
            "Part Name",
            "Part Number",
            "Part Group",
            "Material",
            "Dimensions",
            "Weight",
            "Quantity per Primary",
            "Quantity per Secondary",
            "Secondary Weight",
            "Selected Container",
            "Pallets per Container",
            "Utilization",
            "Sustainability Score",
            "Estimated Cost",
        ];
        let positions: Vec<usize> = columns
            .iter()
            .map(|c| json.find(&format!("\"{}\":", c)).expect("column present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn store_appends_in_order() {
        let store = InMemorySubmissionStore::new();
        assert!(store.is_empty());
        let config = CalculatorConfig::default();
        assert_eq!(store.append(draft("A").into_submission(&config).unwrap()), 1);
        assert_eq!(store.append(draft("B").into_submission(&config).unwrap()), 2);

        let names: Vec<_> = store.list().into_iter().map(|s| s.supplier_name).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let store = Arc::new(InMemorySubmissionStore::new());
        let submission = draft("Acme")
            .into_submission(&CalculatorConfig::default())
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let submission = submission.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        store.append(submission.clone());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 200);
    }

    #[test]
    fn summary_counts_unique_suppliers() {
        let config = CalculatorConfig::default();
        let mut submissions = vec![
            draft("A").into_submission(&config).unwrap(),
            draft("B").into_submission(&config).unwrap(),
            draft("A").into_submission(&config).unwrap(),
        ];
        submissions[1].secondary_weight = 0.0;

        let summary = SubmissionSummary::from_submissions(&submissions);
        assert_eq!(summary.total_submissions, 3);
        assert_eq!(summary.unique_suppliers, 2);
        let expected = submissions[0].secondary_weight * 2.0 / 3.0;
        assert!((summary.average_secondary_weight - expected).abs() < 1e-9);
    }

    #[test]
    fn empty_summary_is_zero() {
        let summary = SubmissionSummary::from_submissions(&[]);
        assert_eq!(summary.total_submissions, 0);
        assert_eq!(summary.unique_suppliers, 0);
        assert_eq!(summary.average_secondary_weight, 0.0);
    }
}
