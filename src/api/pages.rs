// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTML pages served at `/`

use axum::response::Html;

/// GET / on the upload server
pub async fn upload_page() -> Html<&'static str> {
    Html(UPLOAD_PAGE)
}

/// GET / on the widget UI
pub async fn widget_page() -> Html<&'static str> {
    Html(WIDGET_PAGE)
}

pub const UPLOAD_PAGE: &str = r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
<meta charset="utf-8">
<title>车牌识别系统</title>
<style>
  body { font-family: sans-serif; max-width: 960px; margin: 2rem auto; color: #222; }
  .row { display: flex; gap: 1rem; }
  .row > div { flex: 1; }
  img { max-width: 100%; border: 1px solid #ccc; }
  table { border-collapse: collapse; width: 100%; margin-top: 1rem; }
  td, th { border: 1px solid #ddd; padding: .4rem; text-align: left; }
  .error { color: #c00; }
</style>
</head>
<body>
<h1>车牌识别系统</h1>
<form id="upload-form">
  <input type="file" name="file" accept=".png,.jpg,.jpeg,.gif,.bmp">
  <button type="submit">上传并识别</button>
</form>
<p id="status"></p>
<div class="row">
  <div><h3>原图</h3><img id="original"></div>
  <div><h3>识别结果</h3><img id="result"></div>
</div>
<table id="plates" hidden>
  <thead><tr><th>车牌号</th><th>颜色</th><th>类型</th><th>置信度</th></tr></thead>
  <tbody></tbody>
</table>
<script>
document.getElementById('upload-form').addEventListener('submit', async (ev) => {
  ev.preventDefault();
  const status = document.getElementById('status');
  status.className = '';
  status.textContent = '识别中...';
  const resp = await fetch('/upload', { method: 'POST', body: new FormData(ev.target) });
  const data = await resp.json();
  if (!data.success) {
    status.className = 'error';
    status.textContent = data.error;
    return;
  }
  status.textContent = `检测到 ${data.plates.length} 个车牌`;
  document.getElementById('original').src = data.original_image;
  document.getElementById('result').src = data.result_image;
  const table = document.getElementById('plates');
  const body = table.querySelector('tbody');
  body.innerHTML = '';
  for (const p of data.plates) {
    const tr = document.createElement('tr');
    for (const v of [p.plate_no, p.color, p.plate_type, p.confidence.toFixed(2)]) {
      const td = document.createElement('td');
      td.textContent = v;
      tr.appendChild(td);
    }
    body.appendChild(tr);
  }
  table.hidden = data.plates.length === 0;
});
</script>
</body>
</html>
"#;

pub const WIDGET_PAGE: &str = r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
<meta charset="utf-8">
<title>车辆识别系统</title>
<style>
  body { font-family: sans-serif; max-width: 1100px; margin: 2rem auto; color: #222; }
  .row { display: flex; gap: 2rem; }
  .col { flex: 1; }
  .frame { height: 400px; border: 1px dashed #aaa; display: flex; align-items: center; justify-content: center; }
  .frame img { max-height: 100%; max-width: 100%; }
  button { padding: .6rem 1.4rem; font-size: 1rem; margin-right: .5rem; }
  textarea { width: 100%; }
  #examples img { height: 80px; margin: .25rem; cursor: pointer; border: 1px solid #ccc; }
</style>
</head>
<body>
<h1>车牌识别</h1>
<p>根据上传的车辆图片，自动识别车牌信息并进行标注。</p>
<div class="row">
  <div class="col">
    <h3>图片上传</h3>
    <div class="frame"><img id="preview" alt="上传图片"></div>
    <input type="file" id="image" accept=".png,.jpg,.jpeg,.gif,.bmp">
    <p>
      <button id="recognize">开始识别</button>
      <button id="clear">清除图片</button>
    </p>
    <p><strong>使用说明：</strong></p>
    <ol>
      <li>点击上方区域上传图片</li>
      <li>支持 JPG、PNG、JPEG 格式</li>
      <li>点击"开始识别"按钮</li>
      <li>查看右侧识别结果</li>
    </ol>
  </div>
  <div class="col">
    <h3>识别结果</h3>
    <div class="frame"><img id="annotated" alt="标注结果"></div>
    <label for="details">识别详情</label>
    <textarea id="details" rows="8" placeholder="识别结果将在这里显示..." readonly></textarea>
  </div>
</div>
<h3>历史图片</h3>
<div id="examples"></div>
<script>
let selected = null;
const input = document.getElementById('image');
const preview = document.getElementById('preview');

function select(blob, name) {
  selected = { blob, name };
  preview.src = URL.createObjectURL(blob);
}

input.addEventListener('change', () => {
  if (input.files.length) select(input.files[0], input.files[0].name);
});

document.getElementById('clear').addEventListener('click', () => {
  selected = null;
  input.value = '';
  preview.removeAttribute('src');
});

document.getElementById('recognize').addEventListener('click', async () => {
  const details = document.getElementById('details');
  if (!selected) { details.value = '请上传图片'; return; }
  const form = new FormData();
  form.append('image', selected.blob, selected.name);
  details.value = '识别中...';
  const resp = await fetch('/api/recognize', { method: 'POST', body: form });
  const data = await resp.json();
  if (!resp.ok) { details.value = data.error; return; }
  document.getElementById('annotated').src = data.image;
  details.value = data.text;
});

fetch('/api/examples').then(r => r.json()).then(data => {
  const box = document.getElementById('examples');
  for (const ex of data.examples) {
    const img = document.createElement('img');
    img.src = ex.url;
    img.title = ex.name;
    img.addEventListener('click', async () => {
      const blob = await (await fetch(ex.url)).blob();
      select(blob, ex.name);
    });
    box.appendChild(img);
  }
});
</script>
</body>
</html>
"#;
