use actix_web::web;

pub mod backend_health;
pub mod matches;
pub mod websocket;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(backend_health::backend_health);

    cfg.service(
        web::scope("/matches")
            .service(matches::upcoming_matches)
            .service(matches::program_match)
            .service(matches::list_matches)
            .service(matches::reprogram_match)
            .service(matches::add_score_event)
            .service(matches::adjust_score)
            .service(matches::add_foul)
            .service(matches::adjust_fouls)
            .service(matches::start_timer)
            .service(matches::pause_timer)
            .service(matches::resume_timer)
            .service(matches::reset_timer)
            .service(matches::advance_quarter)
            .service(matches::auto_advance_quarter)
            .service(matches::set_quarter)
            .service(matches::finish_match)
            .service(matches::cancel_match)
            .service(matches::suspend_match)
            .service(matches::get_match),
    );

    // Match room WebSocket (anonymous viewers)
    cfg.service(web::resource("/match-ws").route(web::get().to(websocket::match_ws_route)));
}
