use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::figures::list_figures,
        api::figures::register_figure,
        api::figures::get_figure,
        api::master::search,
        api::timeline::get_timeline,
    ),
    tags(
        (name = "figurelog", description = "FigureLog API")
    )
)]
pub struct ApiDoc;
