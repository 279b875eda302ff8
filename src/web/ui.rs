use axum::response::{Html, IntoResponse};

/// 首页处理器
pub async fn index_handler() -> impl IntoResponse {
    Html(INDEX_HTML)
}

/// 上传页处理器
pub async fn upload_handler() -> impl IntoResponse {
    Html(UPLOAD_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Brain Tumor Classifier</title>
</head>
<body>
    <h1>Brain Tumor Classifier</h1>
    <p>Upload an MRI brain scan to classify it as glioma, meningioma or pituitary tumor.</p>
    <p><a href="/upload">Upload a scan</a></p>
</body>
</html>
"#;

const UPLOAD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Upload Scan - Brain Tumor Classifier</title>
</head>
<body>
    <h1>Upload a brain scan</h1>
    <form action="/predict" method="post" enctype="multipart/form-data">
        <input type="file" name="file" accept="image/*" required>
        <button type="submit">Classify</button>
    </form>
</body>
</html>
"#;
