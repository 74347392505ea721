use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use tiny_http::{Header, Response, Server};

/// Canned `(status, body)` answers keyed by request path.
pub type Routes = HashMap<&'static str, (u16, String)>;

/// Starts a local stand-in for the API and returns its base URL.
pub fn serve(routes: Routes) -> String {
    let server = Arc::new(Server::http("127.0.0.1:0").expect("bind test server"));
    let addr = server
        .server_addr()
        .to_ip()
        .expect("test server listens on ip");
    thread::spawn(move || {
        for request in server.incoming_requests() {
            let path = request.url().split('?').next().unwrap_or("").to_string();
            let (status, body) = routes
                .get(path.as_str())
                .cloned()
                .unwrap_or((404, "{\"message\":\"not found\"}".to_string()));
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("valid header"),
                );
            let _ = request.respond(response);
        }
    });
    format!("http://{addr}")
}

pub const POSTS: &str = r#"{"posts":[
  {"id":1,"title":"His mother had always taught him","body":"Be kind.","tags":["history","american","crime"],"reactions":{"likes":192,"dislikes":25},"views":305,"userId":121},
  {"id":2,"title":"He was an expert but not in a discipline","body":"Flower arrangements.","tags":["french","fiction","english"],"reactions":{"likes":859,"dislikes":32},"views":4884,"userId":91},
  {"id":3,"title":"Dave watched as the forest burned up on the hill.","body":"Smoke.","tags":[],"reactions":1448,"views":4966,"userId":404}
],"total":3,"skip":0,"limit":30}"#;

pub const USERS: &str = r#"{"users":[
  {"id":121,"firstName":"Emily","lastName":"Johnson","maidenName":"Smith","age":28,"username":"emilys","email":"emily.johnson@x.dummyjson.com","phone":"+81 965-431-3024","image":"https://dummyjson.com/icon/emilys/128"},
  {"id":91,"firstName":"Michael","lastName":"Williams","username":"michaelw","email":"michael.williams@x.dummyjson.com","phone":"+49 258-627-6644","image":"https://dummyjson.com/icon/michaelw/128"}
],"total":2,"skip":0,"limit":30}"#;

pub const COMMENTS: &str = r#"{"comments":[
  {"id":1,"body":"This is some awesome thinking!","postId":1,"likes":3,"user":{"id":91,"username":"mike-old","fullName":"Michael Williams"}},
  {"id":2,"body":"What terrific math skills you're showing!","postId":2,"likes":4,"user":{"id":555,"username":"ghost","fullName":"Gone Away"}},
  {"id":3,"body":"You are an amazing writer!","postId":1,"likes":2,"user":{"id":121,"username":"emilys","fullName":"Emily Johnson"}}
],"total":3,"skip":0,"limit":30}"#;

pub fn healthy_routes() -> Routes {
    let mut routes = Routes::new();
    routes.insert("/posts", (200, POSTS.to_string()));
    routes.insert("/users", (200, USERS.to_string()));
    routes.insert("/comments", (200, COMMENTS.to_string()));
    routes
}
