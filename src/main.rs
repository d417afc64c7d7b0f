use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use anyhow::Result;

use hris_be::database::{
    init_database,
    repositories::{BalanceRepository, EmployeeRepository},
};
use hris_be::handlers::{accrual, balance, employees, overtime};
use hris_be::{AccrualService, Config, OvertimeWorkflow};

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("HRIS API v1.0")
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init();

    // Load configuration
    let config = Config::from_env()?;
    log::info!("configuration loaded (environment: {})", config.environment);

    // Initialize database
    let pool = init_database(&config.database_url).await?;
    log::info!("database initialized");

    // Initialize repositories and services
    let employee_repository = EmployeeRepository::new(pool.clone());
    let balance_repository = BalanceRepository::new(pool.clone());
    let workflow = OvertimeWorkflow::new(pool.clone(), config.entry_window_days);
    let accrual_service = AccrualService::new(
        employee_repository.clone(),
        balance_repository.clone(),
    );

    let employee_repo_data = web::Data::new(employee_repository);
    let balance_repo_data = web::Data::new(balance_repository);
    let workflow_data = web::Data::new(workflow);
    let accrual_data = web::Data::new(accrual_service);
    let config_data = web::Data::new(config.clone());

    let server_address = config.server_address();
    log::info!("server starting on http://{}", server_address);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(employee_repo_data.clone())
            .app_data(balance_repo_data.clone())
            .app_data(workflow_data.clone())
            .app_data(accrual_data.clone())
            .app_data(config_data.clone())
            .wrap(
                Cors::default()
                    .allowed_origin("http://localhost:3000")
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        "Authorization",
                        "Content-Type",
                        "Accept",
                        "X-Requested-With",
                        "X-Actor-Id",
                    ])
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(hello)
            .service(health)
            .service(
                web::scope("/api/v1")
                    .service(
                        web::scope("/overtime")
                            .route("", web::post().to(overtime::submit))
                            .route("", web::get().to(overtime::list_requests))
                            .route("/{id}", web::get().to(overtime::get_request))
                            .route("/{id}", web::put().to(overtime::edit))
                            .route("/{id}", web::delete().to(overtime::delete_request))
                            .route("/{id}/resubmit", web::post().to(overtime::resubmit))
                            .route(
                                "/{id}/approve-supervisor",
                                web::post().to(overtime::approve_supervisor),
                            )
                            .route(
                                "/{id}/reject-supervisor",
                                web::post().to(overtime::reject_supervisor),
                            )
                            .route(
                                "/{id}/approve-division-head",
                                web::post().to(overtime::approve_division_head),
                            )
                            .route(
                                "/{id}/reject-division-head",
                                web::post().to(overtime::reject_division_head),
                            )
                            .route("/{id}/approve", web::post().to(overtime::final_approve))
                            .route("/{id}/reject", web::post().to(overtime::final_reject))
                            .route(
                                "/{id}/request-revision",
                                web::post().to(overtime::request_revision),
                            )
                            .route(
                                "/{id}/admin-reject",
                                web::post().to(overtime::admin_reject),
                            )
                            .route("/{id}/history", web::get().to(overtime::history)),
                    )
                    .service(
                        web::scope("/balances")
                            .route(
                                "/overtime/{employee_id}",
                                web::get().to(balance::get_overtime_balance),
                            )
                            .route(
                                "/overtime/{employee_id}/adjust",
                                web::post().to(balance::adjust_overtime_balance),
                            )
                            .route(
                                "/overtime/{employee_id}/mark-paid",
                                web::post().to(balance::mark_paid),
                            )
                            .route(
                                "/overtime/{employee_id}/adjustments",
                                web::get().to(balance::list_adjustments),
                            )
                            .route(
                                "/leave/{employee_id}/{year}",
                                web::get().to(balance::get_leave_balance),
                            )
                            .route(
                                "/leave/{employee_id}/{year}/quota",
                                web::put().to(balance::set_leave_quota),
                            ),
                    )
                    .service(
                        web::scope("/accrual")
                            .route("/run/{year}", web::post().to(accrual::run_yearly_accrual)),
                    )
                    .service(
                        web::scope("/employees")
                            .route("", web::post().to(employees::create_employee))
                            .route("/{id}", web::get().to(employees::get_employee)),
                    ),
            )
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
