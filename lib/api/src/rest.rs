use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use actix_cors::Cors;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use scapes_core::item::ItemId;
use scapes_core::{parse_tokens, Error, Item, Layout};
use scapes_storage::StorageManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Deserialize)]
struct DateQuery {
    at: String,
}

#[derive(Deserialize)]
struct HoldingsRequest {
    ids: Vec<ItemId>,
}

#[derive(Deserialize)]
struct CompleteRequest {
    tokens: Vec<String>,
}

#[derive(Deserialize)]
struct LayoutRequest {
    layout: Layout,
    tokens: Vec<String>,
}

#[derive(Serialize)]
struct AttributeScore {
    label: String,
    score: f64,
}

#[derive(Serialize)]
struct ItemCard {
    id: ItemId,
    rarity_score: f64,
    /// 1-based for display
    rank: usize,
    catalogue_size: usize,
    date: Option<String>,
    attributes: Vec<AttributeScore>,
    image_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_image: Option<String>,
}

#[derive(Serialize)]
struct Holding {
    id: ItemId,
    rank: usize,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(
        storage: Arc<StorageManager>,
        port: u16,
    ) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(storage.clone()))
                .configure(RestApi::configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }

    /// Register every route; expects `web::Data<Arc<StorageManager>>` in app data
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.route("/items/{id}", web::get().to(get_item))
            .route("/items/{id}/highlight", web::get().to(get_highlight))
            .route("/ranks/{rank}", web::get().to(get_by_rank))
            .route("/random", web::get().to(get_random))
            .route("/date", web::get().to(get_by_date))
            .route("/holdings", web::post().to(rank_holdings))
            .route("/complete", web::post().to(complete_sequence))
            .route("/layout", web::post().to(plan_layout))
            .route("/rarity/recompute", web::post().to(recompute_rarity));
    }
}

fn error_response(e: &Error) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        Error::ItemNotFound(_) | Error::RankOutOfRange { .. } => HttpResponse::NotFound().json(body),
        e if e.is_request_error() => HttpResponse::BadRequest().json(body),
        _ => {
            warn!("Request failed: {}", e);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn format_date(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// `YYYY-MM-DD` with optional `hh:mm[:ss]`, separated by a space or `T`, as UTC
fn parse_date(input: &str) -> Option<i64> {
    let input = input.trim();
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|dt| dt.and_utc().timestamp())
}

fn item_card(storage: &StorageManager, item: &Item, catalogue_size: usize) -> ItemCard {
    ItemCard {
        id: item.id,
        rarity_score: item.rarity_score,
        rank: item.rank + 1,
        catalogue_size,
        date: item.date.and_then(format_date),
        attributes: item
            .rarest_attributes()
            .into_iter()
            .map(|(label, score)| AttributeScore { label, score })
            .collect(),
        image_path: storage.image_path(item.id).display().to_string(),
        external_image: item.external_image().map(str::to_string),
    }
}

fn card_response(storage: &StorageManager, id: ItemId) -> HttpResponse {
    let catalogue = storage.catalogue();
    match catalogue.get(id) {
        Ok(item) => HttpResponse::Ok().json(serde_json::json!({
            "result": item_card(storage, item, catalogue.len())
        })),
        Err(e) => error_response(&e),
    }
}

async fn get_item(
    storage: web::Data<Arc<StorageManager>>,
    path: web::Path<ItemId>,
) -> ActixResult<HttpResponse> {
    Ok(card_response(&storage, path.into_inner()))
}

async fn get_highlight(
    storage: web::Data<Arc<StorageManager>>,
    path: web::Path<ItemId>,
) -> ActixResult<HttpResponse> {
    let catalogue = storage.catalogue();
    let item = match catalogue.get(path.into_inner()) {
        Ok(item) => item,
        Err(e) => return Ok(error_response(&e)),
    };

    let highlight = item.highlight();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "result": {
            "id": item.id,
            "text": highlight.as_ref().map(|h| h.to_string()),
            "highlight": highlight,
            "external_image": item.external_image(),
        }
    })))
}

async fn get_by_rank(
    storage: web::Data<Arc<StorageManager>>,
    path: web::Path<usize>,
) -> ActixResult<HttpResponse> {
    let rank = path.into_inner();
    let size = storage.catalogue().len();
    if rank == 0 {
        return Ok(error_response(&Error::RankOutOfRange { rank, size }));
    }

    let id = match storage.catalogue().by_rank(rank - 1) {
        Ok(item) => item.id,
        Err(_) => return Ok(error_response(&Error::RankOutOfRange { rank, size })),
    };
    Ok(card_response(&storage, id))
}

async fn get_random(
    storage: web::Data<Arc<StorageManager>>,
) -> ActixResult<HttpResponse> {
    let id = storage.catalogue().random_id(&mut rand::rng());
    match id {
        Some(id) => Ok(card_response(&storage, id)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Catalogue is empty"
        }))),
    }
}

async fn get_by_date(
    storage: web::Data<Arc<StorageManager>>,
    query: web::Query<DateQuery>,
) -> ActixResult<HttpResponse> {
    let timestamp = match parse_date(&query.at) {
        Some(ts) => ts,
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid date format. Write the date as YYYY-MM-DD hh:mm. Hour and minute are optional."
            })));
        }
    };

    let id = storage.catalogue().closest_to_date(timestamp).map(|item| item.id);
    match id {
        Some(id) => Ok(card_response(&storage, id)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "No dated items"
        }))),
    }
}

async fn rank_holdings(
    storage: web::Data<Arc<StorageManager>>,
    req: web::Json<HoldingsRequest>,
) -> ActixResult<HttpResponse> {
    match storage.catalogue().ranked_holdings(&req.ids) {
        Ok(holdings) => {
            let result: Vec<Holding> = holdings
                .into_iter()
                .map(|(rank, id)| Holding { id, rank: rank + 1 })
                .collect();
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "result": result
            })))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

async fn complete_sequence(
    storage: web::Data<Arc<StorageManager>>,
    req: web::Json<CompleteRequest>,
) -> ActixResult<HttpResponse> {
    let resolved = parse_tokens(&req.tokens).and_then(|tokens| storage.complete(&tokens));
    match resolved {
        Ok(resolved) => {
            debug!("Completed {:?} -> {:?}", req.tokens, resolved);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "result": resolved
            })))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

async fn plan_layout(
    storage: web::Data<Arc<StorageManager>>,
    req: web::Json<LayoutRequest>,
) -> ActixResult<HttpResponse> {
    let plan = req
        .layout
        .validate(req.tokens.len())
        .and_then(|_| parse_tokens(&req.tokens))
        .and_then(|tokens| storage.complete(&tokens))
        .and_then(|resolved| req.layout.plan(&resolved));
    match plan {
        Ok(plan) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": plan
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn recompute_rarity(
    storage: web::Data<Arc<StorageManager>>,
) -> ActixResult<HttpResponse> {
    match storage.recompute_rarity() {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": true
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}
