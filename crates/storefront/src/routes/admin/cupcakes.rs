//! Catalog management: listing, create, edit, delete and image uploads.

use std::path::Path as FsPath;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect},
};
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use cupcake_core::{CupcakeId, Price, PriceError};

use crate::db::{CupcakeRepository, DeleteOutcome, OrderRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{FlashLevel, PageContext, RequireAdmin, push_flash};
use crate::models::{Cupcake, CupcakeInput, CupcakeListing, OrderSummary};
use crate::state::AppState;

/// Image extensions accepted for catalog uploads.
const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

// =============================================================================
// Upload Parsing
// =============================================================================

/// Raw fields of the catalog form.
#[derive(Debug, Default)]
pub struct CupcakeUpload {
    pub name: String,
    pub description: String,
    pub price: String,
    pub active: bool,
    /// Client file name and contents; absent when no file was chosen.
    pub image: Option<(String, Vec<u8>)>,
}

impl CupcakeUpload {
    /// Read every field of a multipart body.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the body is malformed or too large.
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut upload = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_owned();
            match name.as_str() {
                "imagem" => {
                    let file_name = field.file_name().unwrap_or_default().to_owned();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    if !file_name.is_empty() && !bytes.is_empty() {
                        upload.image = Some((file_name, bytes.to_vec()));
                    }
                }
                other => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    match other {
                        "nome" => upload.name = value.trim().to_owned(),
                        "descricao" => upload.description = value.trim().to_owned(),
                        "preco" => upload.price = value,
                        "ativo" => upload.active = true,
                        _ => {}
                    }
                }
            }
        }

        Ok(upload)
    }

    /// Check the fields, returning the flash message for the first problem.
    ///
    /// # Errors
    ///
    /// Returns the message to show when a field is invalid.
    pub fn validate(&self, image_required: bool) -> std::result::Result<Price, &'static str> {
        if self.name.is_empty() {
            return Err("Informe o nome do cupcake.");
        }
        let price = Price::parse_positive(&self.price).map_err(|e| match e {
            PriceError::Invalid(_) => "Preço inválido. Digite um valor numérico.",
            PriceError::NotPositive => "O preço deve ser maior que zero!",
            PriceError::TooLarge => "Preço inválido. O valor máximo é R$ 99999999.99.",
        })?;
        match &self.image {
            None if image_required => Err("Selecione uma imagem para o cupcake."),
            Some((file_name, _)) if sanitize_file_name(file_name).is_none() => {
                Err("Formato de imagem não suportado.")
            }
            _ => Ok(price),
        }
    }
}

/// Reduce a client file name to a safe `name.ext` with an allowed extension.
fn sanitize_file_name(original: &str) -> Option<String> {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let (stem, extension) = cleaned.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    if stem.is_empty() || !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }
    Some(format!("{stem}.{extension}"))
}

/// Write an uploaded image under a unique name and return that name.
async fn store_image(dir: &FsPath, original: &str, bytes: &[u8]) -> Result<String> {
    let safe = sanitize_file_name(original)
        .ok_or_else(|| AppError::BadRequest("Formato de imagem não suportado.".to_string()))?;
    let file_name = format!("{}_{safe}", Uuid::new_v4().simple());

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(format!("upload dir: {e}")))?;
    tokio::fs::write(dir.join(&file_name), bytes)
        .await
        .map_err(|e| AppError::Internal(format!("image write: {e}")))?;

    tracing::info!(file = %file_name, bytes = bytes.len(), "Stored catalog image");
    Ok(file_name)
}

// =============================================================================
// Templates
// =============================================================================

/// Catalog listing template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/cupcakes.html")]
pub struct CupcakesTemplate {
    pub page: PageContext,
    pub listings: Vec<CupcakeListing>,
}

/// Create and edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/cupcake_form.html")]
pub struct CupcakeFormTemplate {
    pub page: PageContext,
    pub action: String,
    pub title: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub active: bool,
    pub image_url: Option<String>,
    pub is_new: bool,
}

impl CupcakeFormTemplate {
    fn blank(page: PageContext) -> Self {
        Self {
            page,
            action: "/admin/cupcake/novo".to_string(),
            title: "Novo cupcake".to_string(),
            name: String::new(),
            description: String::new(),
            price: String::new(),
            active: true,
            image_url: None,
            is_new: true,
        }
    }

    fn editing(page: PageContext, cupcake: &Cupcake) -> Self {
        Self {
            page,
            action: format!("/admin/cupcake/edit/{}", cupcake.id),
            title: format!("Editar {}", cupcake.name),
            name: cupcake.name.clone(),
            description: cupcake.description.clone(),
            price: cupcake.price.plain(),
            active: cupcake.active,
            image_url: Some(cupcake.image_url()),
            is_new: false,
        }
    }
}

/// Orders containing one item.
#[derive(Template, WebTemplate)]
#[template(path = "admin/cupcake_orders.html")]
pub struct CupcakeOrdersTemplate {
    pub page: PageContext,
    pub cupcake: Cupcake,
    pub orders: Vec<OrderSummary>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Every catalog item with rating and sales flags.
#[instrument(skip(_admin, state, page))]
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let listings = CupcakeRepository::new(state.pool()).list_with_stats().await?;
    Ok(CupcakesTemplate { page, listings })
}

/// Display the create form.
pub async fn new_page(RequireAdmin(_admin): RequireAdmin, page: PageContext) -> impl IntoResponse {
    CupcakeFormTemplate::blank(page)
}

/// Add an item to the catalog.
#[instrument(skip(admin, state, session, multipart), fields(admin_id = %admin.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Redirect> {
    let upload = CupcakeUpload::read(multipart).await?;
    let price = match upload.validate(true) {
        Ok(price) => price,
        Err(message) => {
            tracing::warn!(reason = message, "Catalog item rejected");
            push_flash(&session, FlashLevel::Danger, message).await?;
            return Ok(Redirect::to("/admin/cupcake/novo"));
        }
    };

    let image = match &upload.image {
        Some((file_name, bytes)) => {
            Some(store_image(&state.config().upload_dir, file_name, bytes).await?)
        }
        None => None,
    };

    let cupcake = CupcakeRepository::new(state.pool())
        .create(&CupcakeInput {
            name: upload.name,
            description: upload.description,
            price,
            image,
            active: true,
        })
        .await?;

    tracing::info!(cupcake_id = %cupcake.id, "Catalog item created");
    push_flash(&session, FlashLevel::Success, "Cupcake cadastrado com sucesso!").await?;
    Ok(Redirect::to("/admin/cupcakes"))
}

/// Display the edit form.
#[instrument(skip(_admin, state, page))]
pub async fn edit_page(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CupcakeId>,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let cupcake = CupcakeRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cupcake {id}")))?;

    Ok(CupcakeFormTemplate::editing(page, &cupcake))
}

/// Save an edited item, replacing the image only when a new one came in.
#[instrument(skip(admin, state, session, multipart), fields(admin_id = %admin.id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CupcakeId>,
    multipart: Multipart,
) -> Result<Redirect> {
    let upload = CupcakeUpload::read(multipart).await?;
    let price = match upload.validate(false) {
        Ok(price) => price,
        Err(message) => {
            tracing::warn!(reason = message, "Catalog edit rejected");
            push_flash(&session, FlashLevel::Danger, message).await?;
            return Ok(Redirect::to(&format!("/admin/cupcake/edit/{id}")));
        }
    };

    let image = match &upload.image {
        Some((file_name, bytes)) => {
            Some(store_image(&state.config().upload_dir, file_name, bytes).await?)
        }
        None => None,
    };

    CupcakeRepository::new(state.pool())
        .update(
            id,
            &CupcakeInput {
                name: upload.name,
                description: upload.description,
                price,
                image,
                active: upload.active,
            },
        )
        .await?;

    tracing::info!(cupcake_id = %id, "Catalog item updated");
    push_flash(&session, FlashLevel::Success, "Cupcake atualizado com sucesso!").await?;
    Ok(Redirect::to("/admin/cupcakes"))
}

/// Delete an item, or deactivate it when it was ever sold.
#[instrument(skip(admin, state, session), fields(admin_id = %admin.id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CupcakeId>,
) -> Result<Redirect> {
    match CupcakeRepository::new(state.pool())
        .delete_or_deactivate(id)
        .await?
    {
        DeleteOutcome::Deleted => {
            tracing::info!(cupcake_id = %id, "Catalog item deleted");
            push_flash(&session, FlashLevel::Success, "Cupcake excluído com sucesso!").await?;
        }
        DeleteOutcome::Deactivated => {
            tracing::info!(cupcake_id = %id, "Catalog item deactivated instead of deleted");
            push_flash(
                &session,
                FlashLevel::Warning,
                "⚠️ Este cupcake já foi vendido. Ele foi DESATIVADO ao invés de excluído.",
            )
            .await?;
        }
    }
    Ok(Redirect::to("/admin/cupcakes"))
}

/// Orders that contain an item.
#[instrument(skip(_admin, state, page))]
pub async fn orders(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CupcakeId>,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let cupcake = CupcakeRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cupcake {id}")))?;
    let orders = OrderRepository::new(state.pool()).containing(id).await?;

    Ok(CupcakeOrdersTemplate {
        page,
        cupcake,
        orders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, price: &str, image: Option<&str>) -> CupcakeUpload {
        CupcakeUpload {
            name: name.to_string(),
            description: String::new(),
            price: price.to_string(),
            active: true,
            image: image.map(|f| (f.to_string(), vec![1, 2, 3])),
        }
    }

    #[test]
    fn test_price_messages() {
        assert_eq!(
            upload("Limão", "abc", Some("a.png")).validate(true),
            Err("Preço inválido. Digite um valor numérico.")
        );
        assert_eq!(
            upload("Limão", "0", Some("a.png")).validate(true),
            Err("O preço deve ser maior que zero!")
        );
        assert_eq!(
            upload("Limão", "1000000000", Some("a.png")).validate(true),
            Err("Preço inválido. O valor máximo é R$ 99999999.99.")
        );
        assert_eq!(
            upload("Limão", "7.50", Some("a.png")).validate(true),
            Ok(Price::from_cents(750))
        );
    }

    #[test]
    fn test_image_required_only_on_create() {
        assert!(upload("Limão", "5", None).validate(true).is_err());
        assert!(upload("Limão", "5", None).validate(false).is_ok());
    }

    #[test]
    fn test_rejects_unknown_image_type() {
        assert_eq!(
            upload("Limão", "5", Some("script.exe")).validate(false),
            Err("Formato de imagem não suportado.")
        );
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(
            sanitize_file_name("Fotos/Red Velvet.JPG").as_deref(),
            Some("RedVelvet.jpg")
        );
        assert_eq!(
            sanitize_file_name("..\\..\\etc\\passwd.png").as_deref(),
            Some("passwd.png")
        );
        assert_eq!(sanitize_file_name("noext"), None);
        assert_eq!(sanitize_file_name(".png"), None);
    }
}
