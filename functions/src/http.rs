use lambda_http::http::StatusCode;
use lambda_http::{Body, Error, Response};
use serde::Serialize;

/// JSON ボディと CORS ヘッダー付きのレスポンスを作成する
pub fn json_response<T: Serialize + ?Sized>(
    status: StatusCode,
    body: &T,
) -> Result<Response<Body>, Error> {
    let body = serde_json::to_string(body)?;
    let response = with_cors(Response::builder())
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body))?;
    Ok(response)
}

/// CORS プリフライトへの空レスポンス
pub fn preflight_response() -> Result<Response<Body>, Error> {
    Ok(with_cors(Response::builder())
        .status(StatusCode::OK)
        .body(Body::Empty)?)
}

fn with_cors(builder: lambda_http::http::response::Builder) -> lambda_http::http::response::Builder {
    builder
        .header("access-control-allow-origin", "*")
        .header("access-control-allow-headers", "Content-Type,Authorization")
        .header("access-control-allow-methods", "OPTIONS,GET,POST")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_response_headers() {
        let response =
            json_response(StatusCode::CREATED, &serde_json::json!({"ok": true})).unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body, serde_json::json!({"ok": true}));
    }
}
