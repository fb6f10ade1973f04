use serde_json::{Map, Value};

/// Extraction schema: a JSON object describing the fields to extract.
pub type ExtractionSchema = Map<String, Value>;

/// Raw input as typed into the research form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResearchForm {
    pub company: String,
    pub user_notes: String,
    pub extraction_schema: String,
}

impl ResearchForm {
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            ..Self::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.user_notes = notes.into();
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.extraction_schema = schema.into();
        self
    }

    /// Validates the form and produces an immutable request.
    pub fn into_request(self) -> Result<AnalysisRequest, RequestError> {
        let schema = validate_schema(&self.extraction_schema)?;
        let mut request = AnalysisRequest::new(self.company)?;
        let notes = self.user_notes.trim();
        if !notes.is_empty() {
            request.user_notes = Some(notes.to_string());
        }
        request.extraction_schema = schema;
        Ok(request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Invalid JSON format")]
    InvalidJson,
    #[error("Schema must be a valid JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("Company name is required")]
    MissingCompany,
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Blank text means "no schema"; anything else must parse to a JSON object.
pub fn validate_schema(text: &str) -> Result<Option<ExtractionSchema>, SchemaError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let parsed: Value = serde_json::from_str(text).map_err(|_| SchemaError::InvalidJson)?;
    match parsed {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(SchemaError::NotAnObject),
    }
}

/// A validated analysis request. The company name is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    company: String,
    user_notes: Option<String>,
    extraction_schema: Option<ExtractionSchema>,
}

impl AnalysisRequest {
    pub fn new(company: impl Into<String>) -> Result<Self, RequestError> {
        let company = company.into().trim().to_string();
        if company.is_empty() {
            return Err(RequestError::MissingCompany);
        }
        Ok(Self {
            company,
            user_notes: None,
            extraction_schema: None,
        })
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.user_notes = Some(notes.into());
        self
    }

    pub fn with_schema(mut self, schema: ExtractionSchema) -> Self {
        self.extraction_schema = Some(schema);
        self
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn user_notes(&self) -> Option<&str> {
        self.user_notes.as_deref()
    }

    pub fn extraction_schema(&self) -> Option<&ExtractionSchema> {
        self.extraction_schema.as_ref()
    }

    /// Query parameters for the live stream endpoint.
    pub fn stream_params(&self, credential: &str) -> StreamParams {
        StreamParams {
            company: self.company.clone(),
            token: credential.to_string(),
            user_notes: self.user_notes.clone(),
            extraction_schema: self
                .extraction_schema
                .as_ref()
                .map(|schema| Value::Object(schema.clone()).to_string()),
        }
    }
}

/// Serialized form of a request as sent to the stream endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamParams {
    pub company: String,
    pub token: String,
    pub user_notes: Option<String>,
    /// Compact JSON text of the extraction schema.
    pub extraction_schema: Option<String>,
}

/// Ready-made extraction schemas offered next to the schema input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaTemplate {
    Simple,
    Detailed,
}

impl SchemaTemplate {
    pub fn text(self) -> &'static str {
        match self {
            SchemaTemplate::Simple => {
                r#"{"founded_year": "int", "headquarters": "str", "industry": "str"}"#
            }
            SchemaTemplate::Detailed => DETAILED_SCHEMA,
        }
    }
}

const DETAILED_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "title": { "type": "string" },
    "company_name": { "type": "string" },
    "company_size": { "type": "integer" },
    "founding_year": { "type": "integer" },
    "founder_names": { "type": "string" },
    "product_description": { "type": "string" },
    "funding_summary": { "type": "string" },
    "controversies": { "type": "string" },
    "acquisitions": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "company": { "type": "string" },
          "year": { "type": "integer" }
        },
        "required": ["company", "year"]
      }
    }
  }
}"#;
