use actix::Actor;
use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{delete, get, patch, post, web, App, HttpResponse, HttpServer, Responder};
use serde_json::json;
use std::convert::TryFrom;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::process;

#[macro_use]
extern crate log;

mod auth;
mod cli;
mod config;
mod database;
mod errors;
mod job;
mod sql;

use auth::{Permissions, User};
use errors::JoblyError;
use job::{JobChanges, JobFilter, Jobs, NewJob};

pub struct Context {
    pub secret: String,
}

#[get("/healthz")]
async fn healthz() -> impl Responder {
    HttpResponse::Ok().body("200 Ok")
}

#[get("/info")]
async fn info() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

#[post("/jobs")]
async fn create_job(
    user: User,
    body: web::Json<NewJob>,
    jobs: web::Data<Jobs>,
) -> Result<HttpResponse, JoblyError> {
    user.require(Permissions::JobWrite)?;

    let job = jobs.create(body.into_inner()).await?;

    Ok(HttpResponse::Created().json(json!({ "job": job })))
}

#[get("/jobs")]
async fn list_jobs(
    filter: web::Query<JobFilter>,
    jobs: web::Data<Jobs>,
) -> Result<HttpResponse, JoblyError> {
    let found = jobs.find(&filter).await?;

    Ok(HttpResponse::Ok().json(json!({ "jobs": found })))
}

#[get("/jobs/{title}")]
async fn get_job(
    title: web::Path<String>,
    jobs: web::Data<Jobs>,
) -> Result<HttpResponse, JoblyError> {
    let job = jobs.get(&title.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({ "job": job })))
}

#[patch("/jobs/{title}")]
async fn update_job(
    user: User,
    title: web::Path<String>,
    body: web::Json<serde_json::Map<String, serde_json::Value>>,
    jobs: web::Data<Jobs>,
) -> Result<HttpResponse, JoblyError> {
    user.require(Permissions::JobWrite)?;

    let changes = JobChanges::try_from(body.into_inner())?;
    let job = jobs.update(&title.into_inner(), changes).await?;

    Ok(HttpResponse::Ok().json(json!({ "job": job })))
}

#[delete("/jobs/{title}")]
async fn delete_job(
    user: User,
    title: web::Path<String>,
    jobs: web::Data<Jobs>,
) -> Result<HttpResponse, JoblyError> {
    user.require(Permissions::JobWrite)?;

    let title = title.into_inner();
    jobs.remove(&title).await?;

    Ok(HttpResponse::Ok().json(json!({ "deleted": title })))
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(healthz)
        .service(info)
        .service(create_job)
        .service(list_jobs)
        .service(get_job)
        .service(update_job)
        .service(delete_job);
}

fn init_logger(verbose: bool) {
    if std::env::var("RUST_LOG").is_err() {
        let level = if verbose {
            "jobly=debug,actix_web=info"
        } else {
            "jobly=info,actix_web=info"
        };
        std::env::set_var("RUST_LOG", level);
    }
    env_logger::init();
}

fn exit_with(err: JoblyError) -> ! {
    eprintln!("{}", err);
    process::exit(1);
}

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    let matches = cli::ask().get_matches();

    init_logger(matches.is_present("verbose"));

    let config_path = matches
        .value_of("config")
        .map(|path| shellexpand::tilde(path).into_owned())
        .unwrap_or_else(|| ".joblyrc".to_owned());

    let config = config::Config::read(&config_path).unwrap_or_else(|err| exit_with(err));
    let secret = config
        .secret(matches.value_of("secret"))
        .unwrap_or_else(|err| exit_with(err));

    if let Some(matches) = matches.subcommand_matches("token") {
        let permissions = config::parse_permissions(matches.value_of("permissions").unwrap_or(""))
            .unwrap_or_else(|err| exit_with(err));
        let duration = config::parse_duration(matches.value_of("duration"))
            .unwrap_or_else(|err| exit_with(err));

        match auth::create_token(&secret, permissions, duration) {
            Ok(token) => println!("Bearer {}", token),
            Err(err) => eprintln!("{}", err),
        }
        return Ok(());
    }

    let serve_matches = match matches.subcommand_matches("serve") {
        Some(matches) => matches,
        None => {
            eprintln!("{}", matches.usage());
            process::exit(1);
        }
    };

    let port = config.port(serve_matches.value_of("port"));
    let database_path = config.database(serve_matches.value_of("database"));

    debug!("Opening database at {}", &database_path);
    let database = database::Database::open(&database_path)
        .unwrap_or_else(|err| exit_with(err))
        .start();

    let localhost = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
    let socket = SocketAddr::new(localhost, port);
    let context = web::Data::new(Context { secret });

    info!("Starting Jobly at {}", &socket);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::new().supports_credentials().finish())
            .app_data(context.clone())
            .data(Jobs::new(database.clone()))
            .configure(routes)
    })
    .bind(socket)?
    .run()
    .await
}
