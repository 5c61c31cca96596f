//! Seed the catalog from a YAML file.
//!
//! Items whose name already exists in the catalog are skipped, so the
//! command can be re-run after editing the file.
//!
//! # File Format
//!
//! ```yaml
//! - nome: Cupcake de Chocolate
//!   descricao: Massa de cacau com ganache
//!   preco: "8.50"
//!   imagem: chocolate.png
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use cupcake_core::Price;
use cupcake_storefront::db::CupcakeRepository;
use cupcake_storefront::models::CupcakeInput;

use super::connect;

/// One catalog entry in the seed file.
#[derive(Debug, Deserialize)]
struct SeedCupcake {
    nome: String,
    #[serde(default)]
    descricao: String,
    preco: String,
    /// File name inside the upload directory.
    #[serde(default)]
    imagem: Option<String>,
}

impl SeedCupcake {
    fn into_input(self) -> Result<CupcakeInput, String> {
        let name = self.nome.trim().to_owned();
        if name.is_empty() {
            return Err("empty name".to_owned());
        }
        let price = Price::parse_positive(&self.preco).map_err(|e| format!("{name}: {e}"))?;

        Ok(CupcakeInput {
            name,
            description: self.descricao.trim().to_owned(),
            price,
            image: self.imagem.filter(|i| !i.trim().is_empty()),
            active: true,
        })
    }
}

/// Parse the seed file and validate every entry before any insert.
fn parse_catalog(content: &str) -> Result<Vec<CupcakeInput>, Box<dyn std::error::Error>> {
    let entries: Vec<SeedCupcake> = serde_yaml::from_str(content)?;

    let mut errors = Vec::new();
    let mut inputs = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.into_input() {
            Ok(input) => inputs.push(input),
            Err(e) => errors.push(e),
        }
    }

    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    Ok(inputs)
}

/// Insert the catalog items listed in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, an entry is
/// invalid, or database operations fail.
pub async fn cupcakes(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");
    let content = tokio::fs::read_to_string(path).await?;
    let inputs = parse_catalog(&content)?;
    info!(items = inputs.len(), "Parsed catalog");

    let pool = connect().await?;
    let repo = CupcakeRepository::new(&pool);

    let existing: HashSet<String> = repo
        .list_all()
        .await?
        .into_iter()
        .map(|c| c.name.to_lowercase())
        .collect();

    let mut inserted = 0_usize;
    let mut skipped = 0_usize;
    for input in &inputs {
        if existing.contains(&input.name.to_lowercase()) {
            skipped += 1;
            continue;
        }
        let cupcake = repo.create(input).await?;
        info!(id = %cupcake.id, name = %cupcake.name, "Inserted");
        inserted += 1;
    }

    info!("Seeding complete!");
    info!("  Items inserted: {inserted}");
    info!("  Items skipped (already exist): {skipped}");

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog() {
        let yaml = r#"
- nome: Cupcake de Chocolate
  descricao: Massa de cacau
  preco: "8.50"
  imagem: chocolate.png
- nome: "  Baunilha  "
  preco: "6"
"#;
        let inputs = parse_catalog(yaml).unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].price, Price::from_cents(850));
        assert_eq!(inputs[0].image.as_deref(), Some("chocolate.png"));
        assert_eq!(inputs[1].name, "Baunilha");
        assert!(inputs[1].image.is_none());
    }

    #[test]
    fn test_parse_catalog_rejects_bad_prices() {
        let yaml = r#"
- nome: Grátis
  preco: "0"
- nome: Sem preço
  preco: "abc"
"#;
        assert!(parse_catalog(yaml).is_err());
    }
}
