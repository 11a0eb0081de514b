use crate::{
    api::{attendance, classroom, image, request, slide},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    governor::middleware::NoOpMiddleware, Governor, GovernorConfigBuilder, PeerIpKeyExtractor,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::get().to(attendance::list_attendance))
                            .route(web::post().to(attendance::mark_attendance)),
                    )
                    // /attendance/code
                    .service(
                        web::resource("/code").route(web::post().to(attendance::issue_code)),
                    ),
            )
            .service(
                web::scope("/classroom")
                    // /classroom
                    .service(
                        web::resource("")
                            .route(web::get().to(classroom::list_classrooms))
                            .route(web::post().to(classroom::create_classroom)),
                    )
                    // /classroom/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(classroom::update_classroom))
                            .route(web::delete().to(classroom::delete_classroom)),
                    ),
            )
            .service(
                web::scope("/slide")
                    // /slide/control, registered before /slide so the literal
                    // segment is not swallowed by a path parameter later on
                    .service(
                        web::resource("/control")
                            .route(web::get().to(slide::list_slide_controls))
                            .route(web::post().to(slide::create_slide_control)),
                    )
                    // /slide
                    .service(
                        web::resource("")
                            .route(web::get().to(slide::list_slides))
                            .route(web::post().to(slide::create_slide)),
                    ),
            )
            .service(
                web::scope("/image")
                    // /image
                    .service(
                        web::resource("")
                            .route(web::get().to(image::list_images))
                            .route(web::post().to(image::create_image)),
                    ),
            )
            .service(
                web::scope("/request")
                    // /request
                    .service(
                        web::resource("")
                            .route(web::get().to(request::list_requests))
                            .route(web::post().to(request::create_request)),
                    )
                    // /request/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(request::update_request))
                            .route(web::delete().to(request::delete_request)),
                    ),
            ),
    );
}
