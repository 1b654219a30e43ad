//! Shared fixtures and helpers for vulnera-contract integration tests

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

use vulnera_contract::domain::{Contract, ContractError};
use vulnera_contract::infrastructure::cache::{Clock, ContractSource, FsContractSource};

/// OpenAPI 3.0 contract for a small users service
pub const USERS_OPENAPI: &str = r#"openapi: 3.0.3
info:
  title: Users
  version: 1.0.0
security:
  - BearerAuth: []
components:
  securitySchemes:
    BearerAuth:
      type: http
      scheme: bearer
  parameters:
    UserId:
      name: id
      in: path
      required: true
      schema:
        type: integer
paths:
  /users/{id}:
    get:
      operationId: getUser
      parameters:
        - $ref: '#/components/parameters/UserId'
      responses:
        '200':
          description: The user
          content:
            application/json:
              schema:
                type: object
        '404':
          description: Not found
  /health:
    get:
      operationId: health
      security: []
      responses: {}
"#;

/// Swagger 2.0 contract with a body parameter
pub const PETS_SWAGGER: &str = r#"swagger: "2.0"
info:
  title: Pets
  version: 1.0.0
consumes:
  - application/json
paths:
  /pets:
    post:
      operationId: createPet
      parameters:
        - name: pet
          in: body
          required: true
          schema:
            type: object
      responses:
        '201':
          description: Created
"#;

/// Go handler guarded by an `Authorization: Bearer` check
pub const GO_BEARER_HANDLER: &str = r#"package handlers

import (
	"net/http"
	"strings"
)

func RequireBearer(next http.Handler) http.Handler {
	return http.HandlerFunc(func(w http.ResponseWriter, r *http.Request) {
		if !strings.HasPrefix(r.Header.Get("Authorization"), "Bearer ") {
			http.Error(w, "unauthorized", http.StatusUnauthorized)
			return
		}
		next.ServeHTTP(w, r)
	})
}

func GetUser(w http.ResponseWriter, r *http.Request) {
	w.WriteHeader(http.StatusOK)
}
"#;

/// Go handler with no security checks
pub const GO_OPEN_HANDLER: &str = r#"package handlers

import "net/http"

func GetUser(w http.ResponseWriter, r *http.Request) {
	w.WriteHeader(http.StatusOK)
}
"#;

/// Write `content` to `dir/name` and return the path
pub fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// Filesystem source that counts parses
#[derive(Default)]
pub struct CountingSource {
    inner: FsContractSource,
    loads: AtomicUsize,
}

impl CountingSource {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ContractSource for CountingSource {
    fn load(&self, path: &Path, cancel: &CancellationToken) -> Result<Contract, ContractError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(path, cancel)
    }

    fn modified(&self, path: &Path) -> std::io::Result<DateTime<Utc>> {
        self.inner.modified(path)
    }
}

/// Clock that only moves when told to
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new() -> Self {
        Self(Mutex::new(Utc::now()))
    }

    pub fn advance(&self, secs: i64) {
        *self.0.lock().unwrap() += chrono::Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}
