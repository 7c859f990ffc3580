/// SOAP operation dispatch
///
/// Implements the six contract operations (`GetAllUsers`, `GetUserById`,
/// `CreateUser`, `UpdateUser`, `DeleteUser`, `SearchUsers`) over the same
/// directory core the REST adapter uses. Arguments arrive as the structured
/// element tree produced by the envelope codec, results go back out as the
/// contract's flattened record shape, and every failure becomes a fault:
/// request-caused errors (validation, not-found, conflicts, unknown
/// operations) with faultcode `Client`, store failures with `Server`.

use super::envelope::{self, EnvelopeError, FaultCode, XmlNode};
use chrono::SecondsFormat;
use axum::http::StatusCode;
use userdir_shared::directory::{Directory, DirectoryError};
use userdir_shared::models::{CreateUser, UpdateUser, User, UserRole};

/// The SOAP entry path alone bounds page sizes
const MAX_PAGE_SIZE: i64 = 100;

/// A rendered fault waiting to be wrapped in an envelope
#[derive(Debug)]
struct Fault {
    code: FaultCode,
    message: String,
}

impl Fault {
    fn client(message: String) -> Self {
        Fault {
            code: FaultCode::Client,
            message,
        }
    }

    /// Maps a directory error into a fault, prefixed with the operation
    /// context (e.g. "Error fetching users: ...")
    fn from_directory(context: &str, err: DirectoryError) -> Self {
        let code = match err {
            DirectoryError::Store(_) => FaultCode::Server,
            _ => FaultCode::Client,
        };

        Fault {
            code,
            message: format!("{}: {}", context, err),
        }
    }

    fn from_render(err: EnvelopeError) -> Self {
        Fault {
            code: FaultCode::Server,
            message: format!("Error rendering response: {}", err),
        }
    }
}

/// Processes one SOAP request body end to end
///
/// Returns the HTTP status and the response envelope. Faults ride on 500 as
/// SOAP 1.1 prescribes for Body faults; successful operations return 200.
pub async fn process(directory: &Directory, body: &str) -> (StatusCode, String) {
    let operation = match envelope::parse_operation(body) {
        Ok(operation) => operation,
        Err(err) => {
            return fault_response(Fault::client(format!("Invalid SOAP request: {}", err)));
        }
    };

    match dispatch(directory, &operation).await {
        Ok(xml) => (StatusCode::OK, xml),
        Err(fault) => fault_response(fault),
    }
}

fn fault_response(fault: Fault) -> (StatusCode, String) {
    let xml = envelope::render_fault(fault.code, &fault.message).unwrap_or_else(|_| {
        // Rendering a flat fault cannot realistically fail; keep a plain
        // envelope on hand so even that path answers with XML
        "<soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\">\
         <soap:Body><soap:Fault><faultcode>Server</faultcode>\
         <faultstring>Internal error</faultstring></soap:Fault></soap:Body>\
         </soap:Envelope>"
            .to_string()
    });

    (StatusCode::INTERNAL_SERVER_ERROR, xml)
}

async fn dispatch(directory: &Directory, request: &XmlNode) -> Result<String, Fault> {
    match request.name.as_str() {
        "GetAllUsersRequest" => get_all_users(directory, request).await,
        "GetUserByIdRequest" => get_user_by_id(directory, request).await,
        "CreateUserRequest" => create_user(directory, request).await,
        "UpdateUserRequest" => update_user(directory, request).await,
        "DeleteUserRequest" => delete_user(directory, request).await,
        "SearchUsersRequest" => search_users(directory, request).await,
        other => Err(Fault::client(format!("Unknown operation: {}", other))),
    }
}

/// GetAllUsers: paginated listing with the collection total
async fn get_all_users(directory: &Directory, request: &XmlNode) -> Result<String, Fault> {
    let page = parse_number(request.child_text("page"));
    // Clamped to 100 on this entry path only; the REST listing is uncapped
    let limit = parse_number(request.child_text("limit")).map(|limit| limit.min(MAX_PAGE_SIZE));

    let result = directory
        .list(page, limit)
        .await
        .map_err(|err| Fault::from_directory("Error fetching users", err))?;

    let mut node = XmlNode::new("result");
    node.push(user_list(&result.users));
    node.push(XmlNode::text("total", &result.total.to_string()));

    envelope::render_response("GetAllUsers", &node).map_err(Fault::from_render)
}

/// GetUserById: one record, flattened
async fn get_user_by_id(directory: &Directory, request: &XmlNode) -> Result<String, Fault> {
    let id = request.child_text("id").unwrap_or_default();

    let user = directory
        .get(id)
        .await
        .map_err(|err| Fault::from_directory("Error fetching user", err))?;

    let mut node = XmlNode::new("result");
    flat_fields(&mut node, &user);

    envelope::render_response("GetUserById", &node).map_err(Fault::from_render)
}

/// CreateUser: validates required fields before touching the core so the
/// contract's own wording is preserved
async fn create_user(directory: &Directory, request: &XmlNode) -> Result<String, Fault> {
    const CONTEXT: &str = "Error creating user";

    let user_node = request.child("user");
    let name = user_node.and_then(|user| non_empty(user.child_text("name")));
    let email = user_node.and_then(|user| non_empty(user.child_text("email")));
    let age = user_node.and_then(|user| non_empty(user.child_text("age")));

    let (Some(name), Some(email), Some(age)) = (name, email, age) else {
        return Err(Fault::client(format!(
            "{}: Name, email, and age are required",
            CONTEXT
        )));
    };

    let age: i64 = age
        .parse()
        .map_err(|_| Fault::client(format!("{}: Age must be a number", CONTEXT)))?;

    let role = match user_node.and_then(|user| non_empty(user.child_text("role"))) {
        None => None,
        Some(text) => Some(
            text.parse::<UserRole>()
                .map_err(|message| Fault::client(format!("{}: {}", CONTEXT, message)))?,
        ),
    };

    let created = directory
        .create(CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            age,
            role,
        })
        .await
        .map_err(|err| Fault::from_directory(CONTEXT, err))?;

    let mut node = XmlNode::new("result");
    flat_fields(&mut node, &created);

    envelope::render_response("CreateUser", &node).map_err(Fault::from_render)
}

/// UpdateUser: partial merge; elements absent from the request leave the
/// stored values untouched
async fn update_user(directory: &Directory, request: &XmlNode) -> Result<String, Fault> {
    const CONTEXT: &str = "Error updating user";

    let Some(id) = non_empty(request.child_text("id")) else {
        return Err(Fault::client(format!("{}: User ID is required", CONTEXT)));
    };

    let user_node = request.child("user");
    let field = |name: &str| user_node.and_then(|user| user.child_text(name));

    let age = match field("age") {
        None => None,
        Some(text) => Some(Some(text.parse::<i64>().map_err(|_| {
            Fault::client(format!("{}: Age must be a number", CONTEXT))
        })?)),
    };

    let role = match field("role") {
        None => None,
        Some(text) => Some(Some(text.parse::<UserRole>().map_err(|message| {
            Fault::client(format!("{}: {}", CONTEXT, message))
        })?)),
    };

    let patch = UpdateUser {
        name: field("name").map(|text| Some(text.to_string())),
        email: field("email").map(|text| Some(text.to_string())),
        age,
        role,
    };

    let updated = directory
        .update(id, patch)
        .await
        .map_err(|err| Fault::from_directory(CONTEXT, err))?;

    let node = acknowledgement(&format!("User {} updated successfully", updated.name));
    envelope::render_response("UpdateUser", &node).map_err(Fault::from_render)
}

/// DeleteUser: hard delete with a human-readable acknowledgement
async fn delete_user(directory: &Directory, request: &XmlNode) -> Result<String, Fault> {
    let id = request.child_text("id").unwrap_or_default();

    let deleted = directory
        .delete(id)
        .await
        .map_err(|err| Fault::from_directory("Error deleting user", err))?;

    let node = acknowledgement(&format!("User {} deleted successfully", deleted.name));
    envelope::render_response("DeleteUser", &node).map_err(Fault::from_render)
}

/// SearchUsers: unpaginated name/email substring search
async fn search_users(directory: &Directory, request: &XmlNode) -> Result<String, Fault> {
    let query = request.child_text("query").unwrap_or_default();

    let result = directory
        .search(query)
        .await
        .map_err(|err| Fault::from_directory("Error searching users", err))?;

    let mut node = XmlNode::new("result");
    node.push(user_list(&result.users));
    node.push(XmlNode::text("total", &result.total.to_string()));

    envelope::render_response("SearchUsers", &node).map_err(Fault::from_render)
}

fn parse_number(text: Option<&str>) -> Option<i64> {
    text.and_then(|raw| raw.trim().parse::<i64>().ok())
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|value| !value.is_empty())
}

/// Renders the contract's flat record shape into `parent`
///
/// `createdAt` is an ISO-8601 string, empty when the record carries no
/// creation timestamp.
fn flat_fields(parent: &mut XmlNode, user: &User) {
    parent.push(XmlNode::text("id", &user.id));
    parent.push(XmlNode::text("name", &user.name));
    parent.push(XmlNode::text("email", &user.email));
    parent.push(XmlNode::text("age", &user.age.to_string()));
    parent.push(XmlNode::text("role", &user.role.to_string()));
    parent.push(XmlNode::text(
        "createdAt",
        &user
            .created_at
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default(),
    ));
}

fn user_list(users: &[User]) -> XmlNode {
    let mut list = XmlNode::new("users");
    for user in users {
        let mut entry = XmlNode::new("user");
        flat_fields(&mut entry, user);
        list.push(entry);
    }
    list
}

fn acknowledgement(message: &str) -> XmlNode {
    let mut node = XmlNode::new("result");
    node.push(XmlNode::text("success", "true"));
    node.push(XmlNode::text("message", message));
    node
}
