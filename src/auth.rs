use actix_web::dev::Payload;
use actix_web::http::header::Header;
use actix_web::{web, HttpRequest};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use futures::future;
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::JoblyError;
use crate::Context;

const ISSUER: &str = "jobly:agent";

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub enum Permissions {
    #[serde(rename = "job:write")]
    JobWrite,
}

impl FromStr for Permissions {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job:write" => Ok(Permissions::JobWrite),
            other => Err(format!("Unknown permission '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct User {
    permissions: Vec<Permissions>,
}

impl User {
    pub fn has_permission(&self, permission: Permissions) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn require(&self, permission: Permissions) -> Result<(), JoblyError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(JoblyError::Forbidden { permission })
        }
    }
}

impl actix_web::FromRequest for User {
    type Config = ();
    type Error = JoblyError;
    type Future = future::Ready<Result<User, JoblyError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user_result = req
            .app_data::<web::Data<Context>>()
            .ok_or(JoblyError::ReadContext {})
            .and_then(|context| {
                let credentials = Authorization::<Bearer>::parse(req)
                    .map_err(|_| JoblyError::MissingToken {})?
                    .into_scheme();

                decode_token(credentials.token(), &context.secret)
            });

        future::ready(user_result)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    exp: usize,  // Expiration time (as UTC timestamp)
    iat: usize,  // Issued at (as UTC timestamp)
    iss: String, // Issuer
    user: User,
}

pub fn create_token(
    secret: &str,
    permissions: Vec<Permissions>,
    duration: i64,
) -> Result<String, JoblyError> {
    let header = JwtHeader::new(Algorithm::HS512);
    let user = User { permissions };
    let now = chrono::Local::now();
    let claims = Claims {
        exp: (now + chrono::Duration::minutes(duration)).timestamp() as usize,
        iat: now.timestamp() as usize,
        iss: ISSUER.to_owned(),
        user,
    };

    encode(
        &header,
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| JoblyError::CreateToken { source: err })
}

fn decode_token(token: &str, secret: &str) -> Result<User, JoblyError> {
    let mut validation = Validation::new(Algorithm::HS512);
    validation.iss = Some(ISSUER.to_owned());

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|token| token.claims.user)
    .map_err(|err| JoblyError::Authenticate { source: err })
}
