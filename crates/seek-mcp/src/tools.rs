//! The tools exposed over `tools/list` and `tools/call`.

use serde_json::{Value, json};

/// A tool the server can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
  Ingest,
  Update,
  Search,
}

impl Tool {
  pub const ALL: [Tool; 3] = [Tool::Ingest, Tool::Update, Tool::Search];

  pub fn from_name(name: &str) -> Option<Self> {
    match name {
      "ingest" => Some(Self::Ingest),
      "update" => Some(Self::Update),
      "search" => Some(Self::Search),
      _ => None,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Self::Ingest => "ingest",
      Self::Update => "update",
      Self::Search => "search",
    }
  }

  fn description(self) -> &'static str {
    match self {
      Self::Ingest => {
        "Store knowledge for a service that has none yet. Fails if the service \
         already has knowledge; use `update` to replace it."
      }
      Self::Update => {
        "Create or replace the knowledge for a service. Each call stores a new \
         version; older versions are kept as bounded history and excluded \
         from search."
      }
      Self::Search => {
        "Find the current knowledge most similar to a natural-language query, \
         ranked by cosine similarity."
      }
    }
  }

  fn input_schema(self) -> Value {
    match self {
      Self::Ingest | Self::Update => json!({
        "type": "object",
        "properties": {
          "service_name": {
            "type": "string",
            "maxLength": 255,
            "description": "Key identifying the service the knowledge describes."
          },
          "content": {
            "type": "string",
            "description": "The knowledge text to store and embed."
          },
          "metadata": {
            "type": "object",
            "description": "Optional free-form attributes stored alongside the content."
          }
        },
        "required": ["service_name", "content"]
      }),
      Self::Search => json!({
        "type": "object",
        "properties": {
          "query": {
            "type": "string",
            "description": "Natural-language search text."
          },
          "k": {
            "type": "integer",
            "minimum": 1,
            "default": 10,
            "description": "Maximum number of results."
          },
          "threshold": {
            "type": "number",
            "minimum": 0,
            "maximum": 1,
            "description": "Minimum similarity a result must reach."
          },
          "service_name": {
            "type": "string",
            "description": "Restrict the search to this service."
          }
        },
        "required": ["query"]
      }),
    }
  }

  /// The `tools/list` entry for this tool.
  pub fn definition(self) -> Value {
    json!({
      "name": self.name(),
      "description": self.description(),
      "inputSchema": self.input_schema(),
    })
  }
}

/// Result of `tools/list`.
pub fn list() -> Value {
  let tools: Vec<Value> = Tool::ALL.iter().map(|t| t.definition()).collect();
  json!({ "tools": tools })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_round_trip() {
    for tool in Tool::ALL {
      assert_eq!(Tool::from_name(tool.name()), Some(tool));
    }
    assert_eq!(Tool::from_name("delete"), None);
  }

  #[test]
  fn schemas_declare_required_fields() {
    let listed = list();
    let tools = listed["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 3);

    let search = tools.iter().find(|t| t["name"] == "search").unwrap();
    assert_eq!(search["inputSchema"]["required"], json!(["query"]));
    assert_eq!(search["inputSchema"]["properties"]["k"]["default"], 10);

    let ingest = tools.iter().find(|t| t["name"] == "ingest").unwrap();
    assert_eq!(ingest["inputSchema"]["required"], json!(["service_name", "content"]));
  }
}
