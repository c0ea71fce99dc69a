//! Relevance report types.

use serde::{Deserialize, Serialize};

/// One ranked section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// Document file name
    pub document: String,
    /// First page of the section
    pub page_number: u32,
    /// Section anchor heading
    pub section_title: String,
    /// 1-based rank, 1 = most similar
    pub importance_rank: usize,
}

/// Extractive summary of a ranked section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedSubsection {
    /// Document file name
    pub document: String,
    /// Section anchor heading
    pub section_title: String,
    /// Query-biased extract of the section text
    pub refined_text: String,
    /// First page of the section
    pub page_number: u32,
}

/// Report metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// File names of the documents that took part in ranking
    pub input_documents: Vec<String>,
    /// Persona of the query
    pub persona: String,
    /// Job of the query
    pub job_to_be_done: String,
    /// UTC ISO-8601 processing timestamp
    pub processed_at: String,
}

/// Output of one relevance query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceReport {
    /// Report metadata
    pub metadata: ReportMetadata,
    /// Ranked sections in rank order
    pub extracted_sections: Vec<RankedResult>,
    /// Refined text, parallel to `extracted_sections`
    pub subsection_analysis: Vec<RefinedSubsection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_json_keys() {
        let report = RelevanceReport {
            metadata: ReportMetadata {
                input_documents: vec!["a.pdf".into()],
                persona: "Chef".into(),
                job_to_be_done: "Menu".into(),
                processed_at: "2024-01-01T00:00:00.000000Z".into(),
            },
            extracted_sections: vec![RankedResult {
                document: "a.pdf".into(),
                page_number: 2,
                section_title: "Mains".into(),
                importance_rank: 1,
            }],
            subsection_analysis: vec![],
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["metadata"]["job_to_be_done"], "Menu");
        assert_eq!(value["extracted_sections"][0]["importance_rank"], 1);
        assert_eq!(value["extracted_sections"][0]["page_number"], 2);
        assert!(value["subsection_analysis"].as_array().unwrap().is_empty());
    }
}
